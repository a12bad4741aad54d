// src/services/document_service.rs

use chrono::{NaiveDate, Utc};
use genpdf::{elements, style, Element};
use image::Luma;
use qrcode::QrCode;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::{
    common::{error::AppError, fiscal},
    config::CompanyProfile,
    models::{
        invoice::{FiscalParty, Invoice, InvoiceKind, DEFAULT_SERIES, CFOP_EXIT},
        order::Order,
    },
    services::invoice_service::generate_access_key,
};

const FONT_FAMILY: &str = "Roboto";

// ---
// Formatação (padrão brasileiro)
// ---

/// 1234.5 -> "1.234,50"
pub fn format_brl(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::new();
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    format!("{}{},{}", if negative { "-" } else { "" }, grouped, frac_part)
}

fn format_quantity(value: Decimal) -> String {
    value.normalize().to_string().replace('.', ",")
}

/// 123 -> "000.000.123"
pub fn format_invoice_number(number: i64) -> String {
    let digits = format!("{:09}", number.rem_euclid(1_000_000_000));
    format!("{}.{}.{}", &digits[0..3], &digits[3..6], &digits[6..9])
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

// ---
// Layout do DANFE (independente do PDF)
// ---
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyBlock {
    pub name: String,
    pub tax_id: String,
    pub address: String,
}

impl From<&FiscalParty> for PartyBlock {
    fn from(party: &FiscalParty) -> Self {
        Self {
            name: party.name.clone(),
            tax_id: party.tax_id.as_deref().map(fiscal::format_tax_id).unwrap_or_default(),
            address: party.address.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DanfeRow {
    pub code: String,
    pub description: String,
    pub ncm: String,
    pub cfop: String,
    pub unit: String,
    pub quantity: String,
    pub unit_price: String,
    pub total: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DanfeLayout {
    pub title: String,
    pub provisional: bool,
    pub operation: String,
    pub number: String,
    pub series: String,
    pub access_key: String,
    pub access_key_formatted: String,
    pub issue_date: String,
    pub issuer: PartyBlock,
    pub recipient: PartyBlock,
    pub rows: Vec<DanfeRow>,
    pub total_products: String,
    pub freight: String,
    pub total_amount: String,
    pub pix_key: Option<String>,
}

fn operation_label(kind: InvoiceKind) -> String {
    match kind {
        InvoiceKind::Entry => format!("{} - ENTRADA", kind.code()),
        InvoiceKind::Exit => format!("{} - SAÍDA", kind.code()),
    }
}

impl DanfeLayout {
    pub fn from_invoice(invoice: &Invoice) -> Self {
        Self {
            title: "DANFE - Documento Auxiliar da Nota Fiscal Eletrônica".to_string(),
            provisional: false,
            operation: operation_label(invoice.kind),
            number: format_invoice_number(invoice.number),
            series: format!("{:03}", invoice.series),
            access_key: invoice.access_key.clone(),
            access_key_formatted: fiscal::format_access_key(&invoice.access_key),
            issue_date: format_date(invoice.issue_date),
            issuer: PartyBlock::from(&invoice.issuer),
            recipient: PartyBlock::from(&invoice.recipient),
            rows: invoice
                .items
                .iter()
                .map(|line| DanfeRow {
                    code: line.product_code.clone(),
                    description: line.description.clone(),
                    ncm: line.ncm.clone().unwrap_or_default(),
                    cfop: line.cfop.clone(),
                    unit: line.unit.clone(),
                    quantity: format_quantity(line.quantity),
                    unit_price: format_brl(line.unit_price),
                    total: format_brl(line.total),
                })
                .collect(),
            total_products: format_brl(invoice.total_products),
            freight: format_brl(invoice.freight),
            total_amount: format_brl(invoice.total_amount),
            pix_key: None,
        }
    }

    /// Espelho de um pedido ainda não faturado, sem valor fiscal.
    pub fn from_order(order: &Order, company: &CompanyProfile) -> Self {
        let issue_date = order.created_at.date_naive();
        let access_key = generate_access_key(
            company.state_code,
            &company.tax_id,
            issue_date,
            DEFAULT_SERIES,
            order.order_number,
            order.id,
        );
        let recipient = FiscalParty {
            name: order.customer_name.clone(),
            tax_id: order.customer_document.clone(),
            address: None,
        };

        Self {
            title: "DANFE - DOCUMENTO PROVISÓRIO, SEM VALOR FISCAL".to_string(),
            provisional: true,
            operation: operation_label(InvoiceKind::Exit),
            number: format_invoice_number(order.order_number),
            series: format!("{:03}", DEFAULT_SERIES),
            access_key_formatted: fiscal::format_access_key(&access_key),
            access_key,
            issue_date: format_date(issue_date),
            issuer: PartyBlock::from(&company.as_party()),
            recipient: PartyBlock::from(&recipient),
            rows: order
                .items
                .iter()
                .map(|item| DanfeRow {
                    code: item.product_code.clone(),
                    description: item.product_name.clone(),
                    ncm: String::new(),
                    cfop: CFOP_EXIT.to_string(),
                    unit: String::new(),
                    quantity: format_quantity(item.quantity),
                    unit_price: format_brl(item.unit_price),
                    total: format_brl(item.total),
                })
                .collect(),
            total_products: format_brl(order.total_amount),
            freight: format_brl(Decimal::ZERO),
            total_amount: format_brl(order.total_amount),
            pix_key: company.pix_key.clone(),
        }
    }
}

// ---
// Renderização em PDF
// ---
#[derive(Clone)]
pub struct DocumentService {
    fonts_dir: String,
    company: CompanyProfile,
}

fn pdf_error(e: impl std::fmt::Display) -> AppError {
    AppError::PdfError(e.to_string())
}

impl DocumentService {
    pub fn new(fonts_dir: String, company: CompanyProfile) -> Self {
        Self { fonts_dir, company }
    }

    pub fn invoice_layout(&self, invoice: &Invoice) -> DanfeLayout {
        DanfeLayout::from_invoice(invoice)
    }

    pub fn order_layout(&self, order: &Order) -> DanfeLayout {
        DanfeLayout::from_order(order, &self.company)
    }

    fn party_block(doc: &mut genpdf::Document, label: &str, party: &PartyBlock) {
        doc.push(elements::Paragraph::new(label).styled(style::Style::new().bold().with_font_size(9)));
        doc.push(elements::Paragraph::new(party.name.clone()));
        if !party.tax_id.is_empty() {
            doc.push(elements::Paragraph::new(format!("CNPJ/CPF: {}", party.tax_id)));
        }
        if !party.address.is_empty() {
            doc.push(
                elements::Paragraph::new(party.address.clone())
                    .styled(style::Style::new().with_font_size(8)),
            );
        }
        doc.push(elements::Break::new(1));
    }

    fn qr_image(content: &str) -> Result<elements::Image, AppError> {
        let code = QrCode::new(content.as_bytes()).map_err(pdf_error)?;
        let image_buffer = code.render::<Luma<u8>>().build();
        let dynamic_image = image::DynamicImage::ImageLuma8(image_buffer);

        Ok(elements::Image::from_dynamic_image(dynamic_image)
            .map_err(pdf_error)?
            .with_scale(genpdf::Scale::new(0.5, 0.5)))
    }

    pub fn render(&self, layout: &DanfeLayout) -> Result<Vec<u8>, AppError> {
        let font_family = genpdf::fonts::from_files(&self.fonts_dir, FONT_FAMILY, None)
            .map_err(|_| AppError::FontNotFound(self.fonts_dir.clone()))?;

        let mut doc = genpdf::Document::new(font_family);
        doc.set_title(format!("DANFE {}", layout.number));
        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(10);
        doc.set_page_decorator(decorator);

        // --- CABEÇALHO ---
        doc.push(
            elements::Paragraph::new(layout.title.clone())
                .styled(style::Style::new().bold().with_font_size(12)),
        );
        doc.push(elements::Paragraph::new(format!(
            "{}   Nº {}   Série {}   Emissão {}",
            layout.operation, layout.number, layout.series, layout.issue_date
        )));
        doc.push(elements::Break::new(1));

        doc.push(elements::Paragraph::new("CHAVE DE ACESSO").styled(style::Style::new().bold()));
        doc.push(elements::Paragraph::new(layout.access_key_formatted.clone()));
        doc.push(Self::qr_image(&layout.access_key)?);
        doc.push(elements::Break::new(1));

        Self::party_block(&mut doc, "EMITENTE", &layout.issuer);
        Self::party_block(&mut doc, "DESTINATÁRIO / REMETENTE", &layout.recipient);

        // --- ITENS ---
        // Pesos: código, descrição, NCM, CFOP, un, qtd, unitário, total
        let mut table = elements::TableLayout::new(vec![2, 5, 2, 1, 1, 1, 2, 2]);
        table.set_cell_decorator(elements::FrameCellDecorator::new(true, true, false));

        let bold = style::Style::new().bold().with_font_size(8);
        let mut header = table.row();
        for title in ["Código", "Descrição", "NCM", "CFOP", "Un", "Qtd", "Unitário", "Total"] {
            header = header.element(elements::Paragraph::new(title).styled(bold));
        }
        header.push().map_err(pdf_error)?;

        let small = style::Style::new().with_font_size(8);
        for row in &layout.rows {
            table
                .row()
                .element(elements::Paragraph::new(row.code.clone()).styled(small))
                .element(elements::Paragraph::new(row.description.clone()).styled(small))
                .element(elements::Paragraph::new(row.ncm.clone()).styled(small))
                .element(elements::Paragraph::new(row.cfop.clone()).styled(small))
                .element(elements::Paragraph::new(row.unit.clone()).styled(small))
                .element(elements::Paragraph::new(row.quantity.clone()).styled(small))
                .element(elements::Paragraph::new(row.unit_price.clone()).styled(small))
                .element(elements::Paragraph::new(row.total.clone()).styled(small))
                .push()
                .map_err(pdf_error)?;
        }
        doc.push(table);
        doc.push(elements::Break::new(1));

        // --- TOTAIS ---
        for (label, value, bold) in [
            ("Valor dos produtos", &layout.total_products, false),
            ("Frete", &layout.freight, false),
            ("VALOR TOTAL DA NOTA", &layout.total_amount, true),
        ] {
            let mut paragraph = elements::Paragraph::new(format!("{}: R$ {}", label, value));
            paragraph.set_alignment(genpdf::Alignment::Right);
            let text_style = if bold { style::Style::new().bold() } else { style::Style::new() };
            doc.push(paragraph.styled(text_style));
        }

        if let Some(key) = &layout.pix_key {
            doc.push(elements::Break::new(1));
            doc.push(
                elements::Paragraph::new("PAGAMENTO VIA PIX")
                    .styled(style::Style::new().bold().with_font_size(10)),
            );
            doc.push(elements::Paragraph::new(format!("Chave: {}", key)));
            doc.push(Self::qr_image(key)?);
        }

        doc.push(elements::Break::new(1));
        doc.push(
            elements::Paragraph::new(format!("Gerado em {}", Utc::now().format("%d/%m/%Y %H:%M")))
                .styled(style::Style::new().italic().with_font_size(7)),
        );

        let mut buffer = Vec::new();
        doc.render(&mut buffer).map_err(pdf_error)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{
            invoice::InvoiceLine,
            order::{OrderItem, OrderStatus},
        },
        test_support::company,
    };
    use uuid::Uuid;

    fn invoice() -> Invoice {
        Invoice {
            id: Uuid::new_v4(),
            kind: InvoiceKind::Entry,
            number: 123,
            series: 1,
            access_key: "35241011222333000181550010000001231000001237".into(),
            issuer: FiscalParty {
                name: "Metalúrgica Paulista Ltda".into(),
                tax_id: Some("11222333000181".into()),
                address: None,
            },
            recipient: company().as_party(),
            issue_date: NaiveDate::from_ymd_opt(2024, 10, 5).unwrap(),
            operation_date: None,
            items: vec![InvoiceLine {
                product_id: Uuid::new_v4(),
                product_code: "P-1".into(),
                description: "Parafuso".into(),
                ncm: Some("73181500".into()),
                cfop: "1102".into(),
                unit: "UN".into(),
                quantity: Decimal::new(15, 1),
                unit_price: Decimal::new(123456, 2),
                total: Decimal::new(185184, 2),
            }],
            total_products: Decimal::new(185184, 2),
            freight: Decimal::ZERO,
            total_amount: Decimal::new(185184, 2),
            purchase_order_id: None,
            order_id: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn brazilian_number_formats() {
        assert_eq!(format_brl(Decimal::new(123456, 2)), "1.234,56");
        assert_eq!(format_brl(Decimal::from(1_000_000)), "1.000.000,00");
        assert_eq!(format_brl(Decimal::new(5, 1)), "0,50");
        assert_eq!(format_invoice_number(123), "000.000.123");
    }

    #[test]
    fn invoice_layout_masks_and_groups() {
        let layout = DanfeLayout::from_invoice(&invoice());
        assert!(!layout.provisional);
        assert_eq!(layout.operation, "0 - ENTRADA");
        assert_eq!(layout.issuer.tax_id, "11.222.333/0001-81");
        assert_eq!(
            layout.access_key_formatted,
            "3524 1011 2223 3300 0181 5500 1000 0001 2310 0000 1237"
        );
        assert_eq!(layout.rows[0].quantity, "1,5");
        assert_eq!(layout.rows[0].total, "1.851,84");
        assert_eq!(layout.issue_date, "05/10/2024");
    }

    #[test]
    fn order_layout_is_provisional_with_company_as_issuer() {
        let order = Order {
            id: Uuid::new_v4(),
            order_number: 7,
            customer_id: None,
            customer_name: "Loja do Zé".into(),
            customer_document: Some("52998224725".into()),
            salesperson_id: Uuid::new_v4(),
            salesperson_name: "Bia".into(),
            items: vec![OrderItem {
                product_id: Uuid::new_v4(),
                product_code: "P-1".into(),
                product_name: "Parafuso".into(),
                quantity: Decimal::from(2),
                unit_price: Decimal::from(10),
                total: Decimal::from(20),
            }],
            total_amount: Decimal::from(20),
            status: OrderStatus::Pending,
            status_history: vec![],
            notes: None,
            invoice_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            shipped_at: None,
        };

        let layout = DanfeLayout::from_order(&order, &company());
        assert!(layout.provisional);
        assert_eq!(layout.issuer.name, company().name);
        assert_eq!(layout.recipient.tax_id, "529.982.247-25");
        assert!(fiscal::is_valid_access_key(&layout.access_key));
        assert_eq!(layout.rows[0].cfop, "5102");
        assert_eq!(layout.total_amount, "20,00");
    }

    #[test]
    fn missing_fonts_are_reported() {
        let service = DocumentService::new("./sem-fontes".into(), company());
        let layout = DanfeLayout::from_invoice(&invoice());
        assert!(matches!(service.render(&layout), Err(AppError::FontNotFound(dir)) if dir == "./sem-fontes"));
    }
}
