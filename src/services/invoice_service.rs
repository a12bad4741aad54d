// src/services/invoice_service.rs

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        fiscal::{self, AccessKeyParts},
        pagination::{ListQuery, Page},
    },
    config::CompanyProfile,
    db::{Query, Repository, SortDirection},
    models::{
        invoice::{
            EntryInvoicePayload, FiscalParty, Invoice, InvoiceFilter, InvoiceKind, InvoiceLine,
            DEFAULT_SERIES,
        },
        kardex::MovementKind,
        order::Order,
        product::Product,
        purchase::PurchaseOrder,
        supplier::Supplier,
        Actor,
    },
    services::inventory_service::{InventoryService, StockMovement},
};

/// Tipo de emissão normal (tpEmis = 1)
const EMISSION_NORMAL: u8 = 1;

/// cNF determinístico a partir do id da nota.
pub fn numeric_code(id: Uuid) -> u32 {
    let bytes = id.as_bytes();
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) % 100_000_000
}

pub fn generate_access_key(
    state_code: u8,
    issuer_tax_id: &str,
    issue_date: NaiveDate,
    series: i64,
    number: i64,
    id: Uuid,
) -> String {
    fiscal::build_access_key(&AccessKeyParts {
        state_code,
        year: issue_date.year(),
        month: issue_date.month(),
        issuer_cnpj: issuer_tax_id,
        series: series.unsigned_abs() as u32,
        number: number.unsigned_abs(),
        emission_type: EMISSION_NORMAL,
        numeric_code: numeric_code(id),
    })
}

fn invoice_line(product: &Product, kind: InvoiceKind, quantity: Decimal, unit_price: Decimal) -> InvoiceLine {
    InvoiceLine {
        product_id: product.id,
        product_code: product.code.clone(),
        description: product.name.clone(),
        ncm: product.ncm.clone(),
        cfop: kind.cfop().to_string(),
        unit: product.unit.clone(),
        quantity,
        unit_price,
        total: quantity * unit_price,
    }
}

fn supplier_party(supplier: &Supplier) -> FiscalParty {
    FiscalParty {
        name: supplier.name.clone(),
        tax_id: Some(supplier.tax_id.clone()),
        address: Some(supplier.address.one_line()).filter(|a| !a.is_empty()),
    }
}

#[derive(Clone)]
pub struct InvoiceService {
    invoices: Repository<Invoice>,
    suppliers: Repository<Supplier>,
    inventory_service: InventoryService,
    company: CompanyProfile,
}

impl InvoiceService {
    pub fn new(
        invoices: Repository<Invoice>,
        suppliers: Repository<Supplier>,
        inventory_service: InventoryService,
        company: CompanyProfile,
    ) -> Self {
        Self { invoices, suppliers, inventory_service, company }
    }

    pub async fn list(&self, query: &ListQuery, filter: &InvoiceFilter) -> Result<Page<Invoice>, AppError> {
        let db_query = match filter.kind {
            Some(kind) => Query::new().eq("kind", kind),
            None => Query::new(),
        };
        let mut invoices = self.invoices.find(&db_query).await?;
        invoices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(query.apply(invoices))
    }

    pub async fn get(&self, id: Uuid) -> Result<Invoice, AppError> {
        self.invoices.require(id).await
    }

    async fn ensure_unique_key(&self, access_key: &str) -> Result<(), AppError> {
        if self.invoices.find_one(Query::new().eq("accessKey", access_key)).await?.is_some() {
            return Err(AppError::CodeAlreadyExists(access_key.to_string()));
        }
        Ok(())
    }

    /// Aplica as movimentações de cada linha; as referências tornam a operação repetível.
    async fn post_movements(
        &self,
        invoice: &Invoice,
        document_ref: &str,
        actor: &Actor,
    ) -> Result<(), AppError> {
        let (kind, sign) = match invoice.kind {
            InvoiceKind::Entry => (MovementKind::Entry, Decimal::ONE),
            InvoiceKind::Exit => (MovementKind::Exit, Decimal::NEGATIVE_ONE),
        };
        for (index, line) in invoice.items.iter().enumerate() {
            self.inventory_service
                .apply_movement(
                    StockMovement {
                        product_id: line.product_id,
                        kind,
                        delta: line.quantity * sign,
                        unit_cost: Some(line.unit_price),
                        document_ref: Some(format!("{}#{}", document_ref, index)),
                        notes: Some(format!("NF {} série {}", invoice.number, invoice.series)),
                    },
                    Some(actor),
                )
                .await?;
        }
        Ok(())
    }

    // =========================================================================
    //  ENTRADA
    // =========================================================================

    /// Lançamento manual da nota do fornecedor; soma o estoque de cada item.
    pub async fn create_entry(&self, payload: EntryInvoicePayload, actor: &Actor) -> Result<Invoice, AppError> {
        payload.validate()?;
        if payload.items.is_empty() {
            return Err(AppError::EmptyItems);
        }

        let supplier = self.suppliers.require(payload.supplier_id).await?;
        let series = payload.series.unwrap_or(DEFAULT_SERIES);
        let id = Uuid::new_v4();

        let access_key = match payload.access_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {
                let digits = fiscal::only_digits(key);
                if !fiscal::is_valid_access_key(&digits) {
                    return Err(AppError::InvalidAccessKey);
                }
                digits
            }
            _ => generate_access_key(
                self.company.state_code,
                &supplier.tax_id,
                payload.issue_date,
                series,
                payload.number,
                id,
            ),
        };
        self.ensure_unique_key(&access_key).await?;

        let mut items = Vec::with_capacity(payload.items.len());
        for line in &payload.items {
            let product = self.inventory_service.get_product(line.product_id).await?;
            items.push(invoice_line(&product, InvoiceKind::Entry, line.quantity, line.unit_price));
        }
        let total_products: Decimal = items.iter().map(|i| i.total).sum();

        let invoice = Invoice {
            id,
            kind: InvoiceKind::Entry,
            number: payload.number,
            series,
            access_key,
            issuer: supplier_party(&supplier),
            recipient: self.company.as_party(),
            issue_date: payload.issue_date,
            operation_date: payload.operation_date,
            items,
            total_products,
            freight: payload.freight,
            total_amount: total_products + payload.freight,
            purchase_order_id: None,
            order_id: None,
            notes: payload.notes,
            created_at: Utc::now(),
        };
        self.invoices.create(&invoice).await?;
        self.post_movements(&invoice, &invoice.document_ref(), actor).await?;

        tracing::info!("🧾 NF de entrada {} lançada ({} itens)", invoice.number, invoice.items.len());
        Ok(invoice)
    }

    /// Nota de entrada do recebimento de uma compra. Repetir a chamada
    /// completa um recebimento interrompido sem duplicar estoque.
    pub async fn receive_purchase(&self, purchase: &PurchaseOrder, actor: &Actor) -> Result<Invoice, AppError> {
        let existing = self
            .invoices
            .find_one(Query::new().eq("purchaseOrderId", purchase.id))
            .await?;

        let invoice = match existing {
            Some(invoice) => invoice,
            None => {
                let supplier = match purchase.supplier_id {
                    Some(id) => self.suppliers.get(id).await?,
                    None => None,
                };
                let issuer = match &supplier {
                    Some(s) => supplier_party(s),
                    None => FiscalParty {
                        name: purchase
                            .supplier_name
                            .clone()
                            .unwrap_or_else(|| "Fornecedor não informado".to_string()),
                        tax_id: None,
                        address: None,
                    },
                };

                let mut items = Vec::with_capacity(purchase.items.len());
                for line in &purchase.items {
                    let product = self.inventory_service.get_product(line.product_id).await?;
                    items.push(invoice_line(&product, InvoiceKind::Entry, line.quantity, line.unit_price));
                }
                let total_products: Decimal = items.iter().map(|i| i.total).sum();

                let id = Uuid::new_v4();
                let today = Utc::now().date_naive();
                let issuer_tax_id = issuer.tax_id.clone().unwrap_or_else(|| self.company.tax_id.clone());
                let invoice = Invoice {
                    id,
                    kind: InvoiceKind::Entry,
                    number: purchase.number,
                    series: DEFAULT_SERIES,
                    access_key: generate_access_key(
                        self.company.state_code,
                        &issuer_tax_id,
                        today,
                        DEFAULT_SERIES,
                        purchase.number,
                        id,
                    ),
                    issuer,
                    recipient: self.company.as_party(),
                    issue_date: today,
                    operation_date: Some(today),
                    items,
                    total_products,
                    freight: Decimal::ZERO,
                    total_amount: total_products,
                    purchase_order_id: Some(purchase.id),
                    order_id: None,
                    notes: purchase.notes.clone(),
                    created_at: Utc::now(),
                };
                self.invoices.create(&invoice).await?;
                invoice
            }
        };

        self.post_movements(&invoice, &purchase.document_ref(), actor).await?;
        Ok(invoice)
    }

    // =========================================================================
    //  SAÍDA
    // =========================================================================

    async fn next_exit_number(&self) -> Result<i64, AppError> {
        let last = self
            .invoices
            .find_one(
                Query::new()
                    .eq("kind", InvoiceKind::Exit)
                    .order_by("number", SortDirection::Desc),
            )
            .await?;
        Ok(last.map(|i| i.number).unwrap_or(0) + 1)
    }

    /// Nota de saída do pedido. Confere o estoque de todas as linhas antes de
    /// baixar qualquer uma.
    pub async fn issue_for_order(&self, order: &Order, actor: &Actor) -> Result<Invoice, AppError> {
        let document_ref = order.document_ref();

        if let Some(invoice) = self.invoices.find_one(Query::new().eq("orderId", order.id)).await? {
            self.post_movements(&invoice, &document_ref, actor).await?;
            return Ok(invoice);
        }

        let mut requested: HashMap<Uuid, Decimal> = HashMap::new();
        for item in &order.items {
            *requested.entry(item.product_id).or_default() += item.quantity;
        }

        let mut products = HashMap::new();
        for (product_id, quantity) in &requested {
            let product = self.inventory_service.get_product(*product_id).await?;
            if product.quantity < *quantity {
                return Err(AppError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.quantity,
                    requested: *quantity,
                });
            }
            products.insert(product.id, product);
        }

        let items: Vec<InvoiceLine> = order
            .items
            .iter()
            .filter_map(|item| {
                products
                    .get(&item.product_id)
                    .map(|p| invoice_line(p, InvoiceKind::Exit, item.quantity, item.unit_price))
            })
            .collect();
        let total_products: Decimal = items.iter().map(|i| i.total).sum();

        let id = Uuid::new_v4();
        let number = self.next_exit_number().await?;
        let today = Utc::now().date_naive();
        let invoice = Invoice {
            id,
            kind: InvoiceKind::Exit,
            number,
            series: DEFAULT_SERIES,
            access_key: generate_access_key(
                self.company.state_code,
                &self.company.tax_id,
                today,
                DEFAULT_SERIES,
                number,
                id,
            ),
            issuer: self.company.as_party(),
            recipient: FiscalParty {
                name: order.customer_name.clone(),
                tax_id: order.customer_document.clone(),
                address: None,
            },
            issue_date: today,
            operation_date: Some(today),
            items,
            total_products,
            freight: Decimal::ZERO,
            total_amount: total_products,
            purchase_order_id: None,
            order_id: Some(order.id),
            notes: order.notes.clone(),
            created_at: Utc::now(),
        };
        self.invoices.create(&invoice).await?;
        self.post_movements(&invoice, &document_ref, actor).await?;

        tracing::info!("🧾 NF de saída {} emitida para o pedido #{}", number, order.order_number);
        Ok(invoice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{invoice::EntryLinePayload, kardex::KardexQuery},
        test_support::{actor, memory_state, product_payload, supplier_payload},
    };

    fn entry(supplier_id: Uuid, product_id: Uuid, access_key: Option<&str>) -> EntryInvoicePayload {
        EntryInvoicePayload {
            supplier_id,
            number: 123,
            series: None,
            access_key: access_key.map(str::to_string),
            issue_date: NaiveDate::from_ymd_opt(2024, 10, 5).unwrap(),
            operation_date: None,
            freight: Decimal::from(15),
            items: vec![EntryLinePayload {
                product_id,
                quantity: Decimal::from(12),
                unit_price: Decimal::from(2),
            }],
            notes: None,
        }
    }

    #[test]
    fn generated_keys_are_valid() {
        let key = generate_access_key(
            35,
            "11.222.333/0001-81",
            NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
            1,
            42,
            Uuid::new_v4(),
        );
        assert_eq!(key.len(), 44);
        assert!(fiscal::is_valid_access_key(&key));
        assert!(key.starts_with("352410"));
    }

    #[tokio::test]
    async fn entry_invoice_increases_stock_with_cfop_1102() {
        let state = memory_state();
        let supplier = state.supplier_service.create(supplier_payload("F-1")).await.unwrap();
        let product = state
            .inventory_service
            .create_product(product_payload("P-1", "Parafuso", 3), &actor())
            .await
            .unwrap();

        let invoice = state
            .invoice_service
            .create_entry(entry(supplier.id, product.id, None), &actor())
            .await
            .unwrap();

        assert_eq!(invoice.items[0].cfop, "1102");
        assert_eq!(invoice.total_amount, Decimal::from(39));
        assert!(fiscal::is_valid_access_key(&invoice.access_key));
        assert_eq!(
            state.inventory_service.get_product(product.id).await.unwrap().quantity,
            Decimal::from(15)
        );

        let history = state
            .inventory_service
            .kardex(&KardexQuery { product_id: Some(product.id) })
            .await
            .unwrap();
        assert_eq!(history[0].kind, MovementKind::Entry);
        assert_eq!(history[0].balance_after, Decimal::from(15));
    }

    #[tokio::test]
    async fn supplied_access_key_must_be_valid() {
        let state = memory_state();
        let supplier = state.supplier_service.create(supplier_payload("F-1")).await.unwrap();
        let product = state
            .inventory_service
            .create_product(product_payload("P-1", "Parafuso", 0), &actor())
            .await
            .unwrap();

        let bad = entry(supplier.id, product.id, Some("35241011222333000181550010000001231000001230"));
        assert!(matches!(
            state.invoice_service.create_entry(bad, &actor()).await,
            Err(AppError::InvalidAccessKey)
        ));

        let good = entry(supplier.id, product.id, Some("3524 1011 2223 3300 0181 5500 1000 0001 2310 0000 1237"));
        let invoice = state.invoice_service.create_entry(good, &actor()).await.unwrap();
        assert_eq!(invoice.access_key, "35241011222333000181550010000001231000001237");
    }
}
