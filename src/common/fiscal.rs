// src/common/fiscal.rs
//
// Documentos fiscais brasileiros: CPF, CNPJ e chave de acesso da NF-e (DANFE).

pub const ACCESS_KEY_LEN: usize = 44;
pub const NFE_MODEL: u8 = 55;

pub fn only_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn digits_of(value: &str) -> Vec<u32> {
    value.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

pub fn is_valid_cpf(value: &str) -> bool {
    let digits = digits_of(value);
    if digits.len() != 11 || all_same(&digits) {
        return false;
    }

    let check = |len: usize| -> u32 {
        let sum: u32 = digits[..len]
            .iter()
            .zip((2..=len as u32 + 1).rev())
            .map(|(d, w)| d * w)
            .sum();
        (sum * 10 % 11) % 10
    };

    check(9) == digits[9] && check(10) == digits[10]
}

pub fn is_valid_cnpj(value: &str) -> bool {
    let digits = digits_of(value);
    if digits.len() != 14 || all_same(&digits) {
        return false;
    }

    const W1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    const W2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

    let check = |weights: &[u32]| -> u32 {
        let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
        match sum % 11 {
            r if r < 2 => 0,
            r => 11 - r,
        }
    };

    check(&W1) == digits[12] && check(&W2) == digits[13]
}

/// CPF (11 dígitos) ou CNPJ (14 dígitos).
pub fn is_valid_tax_id(value: &str) -> bool {
    match only_digits(value).len() {
        11 => is_valid_cpf(value),
        14 => is_valid_cnpj(value),
        _ => false,
    }
}

/// 000.000.000-00 ou 00.000.000/0000-00. Valores fora do padrão voltam sem máscara.
pub fn format_tax_id(value: &str) -> String {
    let d = only_digits(value);
    match d.len() {
        11 => format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11]),
        14 => format!("{}.{}.{}/{}-{}", &d[0..2], &d[2..5], &d[5..8], &d[8..12], &d[12..14]),
        _ => value.to_string(),
    }
}

/// Dígito verificador módulo 11 (pesos 2..9 da direita para a esquerda).
pub fn access_key_check_digit(first_43: &str) -> u32 {
    let sum: u32 = digits_of(first_43)
        .iter()
        .rev()
        .zip((2..=9).cycle())
        .map(|(d, w)| d * w)
        .sum();
    match sum % 11 {
        r if r < 2 => 0,
        r => 11 - r,
    }
}

pub fn is_valid_access_key(value: &str) -> bool {
    let digits = only_digits(value);
    if digits.len() != ACCESS_KEY_LEN || digits.len() != value.trim().len() {
        return false;
    }
    let (body, dv) = digits.split_at(ACCESS_KEY_LEN - 1);
    dv.parse::<u32>().ok() == Some(access_key_check_digit(body))
}

#[derive(Debug, Clone)]
pub struct AccessKeyParts<'a> {
    pub state_code: u8,
    pub year: i32,
    pub month: u32,
    pub issuer_cnpj: &'a str,
    pub series: u32,
    pub number: u64,
    pub emission_type: u8,
    pub numeric_code: u32,
}

/// cUF(2) AAMM(4) CNPJ(14) mod(2) série(3) nNF(9) tpEmis(1) cNF(8) DV(1)
pub fn build_access_key(parts: &AccessKeyParts<'_>) -> String {
    let cnpj = only_digits(parts.issuer_cnpj);
    let body = format!(
        "{:02}{:02}{:02}{:0>14}{:02}{:03}{:09}{:01}{:08}",
        parts.state_code,
        parts.year.rem_euclid(100),
        parts.month,
        &cnpj[cnpj.len().saturating_sub(14)..],
        NFE_MODEL,
        parts.series % 1_000,
        parts.number % 1_000_000_000,
        parts.emission_type % 10,
        parts.numeric_code % 100_000_000,
    );
    let dv = access_key_check_digit(&body);
    format!("{}{}", body, dv)
}

/// Agrupa a chave em blocos de 4 dígitos, como impresso no DANFE.
pub fn format_access_key(key: &str) -> String {
    key.as_bytes()
        .chunks(4)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_known_documents() {
        assert!(is_valid_cnpj("11.222.333/0001-81"));
        assert!(!is_valid_cnpj("11.222.333/0001-82"));
        assert!(!is_valid_cnpj("00.000.000/0000-00"));
        assert!(is_valid_cpf("529.982.247-25"));
        assert!(!is_valid_cpf("529.982.247-24"));
        assert!(!is_valid_cpf("111.111.111-11"));
    }

    #[test]
    fn tax_id_accepts_cpf_or_cnpj() {
        assert!(is_valid_tax_id("52998224725"));
        assert!(is_valid_tax_id("11222333000181"));
        assert!(!is_valid_tax_id("1234"));
    }

    #[test]
    fn formats_tax_ids() {
        assert_eq!(format_tax_id("11222333000181"), "11.222.333/0001-81");
        assert_eq!(format_tax_id("52998224725"), "529.982.247-25");
        assert_eq!(format_tax_id("abc"), "abc");
    }

    #[test]
    fn builds_access_key_with_check_digit() {
        let key = build_access_key(&AccessKeyParts {
            state_code: 35,
            year: 2024,
            month: 10,
            issuer_cnpj: "11.222.333/0001-81",
            series: 1,
            number: 123,
            emission_type: 1,
            numeric_code: 123,
        });

        assert_eq!(key, "35241011222333000181550010000001231000001237");
        assert!(is_valid_access_key(&key));
    }

    #[test]
    fn rejects_tampered_or_malformed_keys() {
        assert!(!is_valid_access_key("35241011222333000181550010000001231000001230"));
        assert!(!is_valid_access_key("3524101122233300018155001000000123100000123"));
        assert!(!is_valid_access_key("3524 1011 2223 3300 0181 5500 1000 0001 2310 0000 1237"));
    }

    #[test]
    fn groups_access_key_by_four() {
        assert_eq!(format_access_key("12345678"), "1234 5678");
    }
}
