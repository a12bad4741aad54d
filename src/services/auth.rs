// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{Query, Repository},
    models::{
        employee::{AuthResponse, Claims, Employee, LoginPayload, RegisterAdminPayload, Role},
        Address,
    },
};

// Hash e verificação rodam fora do runtime (bcrypt é CPU-bound)
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, bcrypt::DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let password_hash = password_hash.to_owned();
    let valid = tokio::task::spawn_blocking(move || verify(&password, &password_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;
    Ok(valid)
}

#[derive(Clone)]
pub struct AuthService {
    employees: Repository<Employee>,
    jwt_secret: String,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(employees: Repository<Employee>, jwt_secret: String, token_ttl: Duration) -> Self {
        Self { employees, jwt_secret, token_ttl }
    }

    /// Cadastro inicial: só funciona enquanto não existe nenhum funcionário.
    pub async fn register_admin(&self, payload: RegisterAdminPayload) -> Result<AuthResponse, AppError> {
        payload.validate()?;

        if self.employees.find_one(Query::new()).await?.is_some() {
            return Err(AppError::RegistrationClosed);
        }

        let now = Utc::now();
        let admin = Employee {
            id: uuid::Uuid::new_v4(),
            name: payload.name.trim().to_string(),
            email: payload.email.trim().to_lowercase(),
            password_hash: hash_password(&payload.password).await?,
            role: Role::Admin,
            designation: Some("Administrador".to_string()),
            salary: Default::default(),
            cpf: None,
            phone: None,
            birth_date: None,
            hire_date: Some(now.date_naive()),
            address: Address::default(),
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.employees.create(&admin).await?;
        tracing::info!("🔑 Administrador inicial {} cadastrado", admin.email);

        let token = self.create_token(&admin)?;
        Ok(AuthResponse { token, employee: admin.into() })
    }

    pub async fn login(&self, payload: LoginPayload) -> Result<AuthResponse, AppError> {
        payload.validate()?;

        let employee = self
            .employees
            .find_one(Query::new().eq("email", payload.email.trim().to_lowercase()))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(&payload.password, &employee.password_hash).await? {
            return Err(AppError::InvalidCredentials);
        }
        if !employee.active {
            return Err(AppError::InactiveEmployee);
        }

        let token = self.create_token(&employee)?;
        Ok(AuthResponse { token, employee: employee.into() })
    }

    /// Decodifica o token e recarrega o funcionário (cargo e status atuais).
    pub async fn validate_token(&self, token: &str) -> Result<Employee, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let employee = self
            .employees
            .get(token_data.claims.sub)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if !employee.active {
            return Err(AppError::InactiveEmployee);
        }
        Ok(employee)
    }

    pub fn create_token(&self, employee: &Employee) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + self.token_ttl;

        let claims = Claims {
            sub: employee.id,
            role: employee.role,
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::memory_state;

    fn admin_payload() -> RegisterAdminPayload {
        RegisterAdminPayload {
            name: "Ana".into(),
            email: "Ana@Empresa.com".into(),
            password: "segredo123".into(),
        }
    }

    #[tokio::test]
    async fn bootstrap_is_allowed_only_once() {
        let state = memory_state();
        let auth = &state.auth_service;

        let first = auth.register_admin(admin_payload()).await.unwrap();
        assert_eq!(first.employee.role, Role::Admin);
        assert_eq!(first.employee.email, "ana@empresa.com");

        assert!(matches!(
            auth.register_admin(admin_payload()).await,
            Err(AppError::RegistrationClosed)
        ));
    }

    #[tokio::test]
    async fn login_and_token_round_trip() {
        let state = memory_state();
        let auth = &state.auth_service;
        auth.register_admin(admin_payload()).await.unwrap();

        let wrong = LoginPayload { email: "ana@empresa.com".into(), password: "errada123".into() };
        assert!(matches!(auth.login(wrong).await, Err(AppError::InvalidCredentials)));

        let ok = LoginPayload { email: "ana@empresa.com".into(), password: "segredo123".into() };
        let response = auth.login(ok).await.unwrap();
        let employee = auth.validate_token(&response.token).await.unwrap();
        assert_eq!(employee.id, response.employee.id);

        assert!(matches!(auth.validate_token("lixo").await, Err(AppError::InvalidToken)));
    }
}
