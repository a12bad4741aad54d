// src/common/pagination.rs

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PER_PAGE: usize = 20;
pub const MAX_PER_PAGE: usize = 100;

// Parâmetros de listagem usados por todas as telas de cadastro.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Texto livre (código, nome, documento, e-mail...)
    pub search: Option<String>,
    /// Página, começando em 1
    pub page: Option<usize>,
    /// Itens por página (máx. 100)
    pub per_page: Option<usize>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}

/// Campos de texto pesquisáveis de uma entidade.
pub trait Searchable {
    fn search_fields(&self) -> Vec<Option<&str>>;

    fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.search_fields()
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let page = page.max(1);
    let per_page = per_page.clamp(1, MAX_PER_PAGE);
    let total = items.len();
    let total_pages = total.div_ceil(per_page);

    let items = items
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    Page { items, page, per_page, total, total_pages }
}

impl ListQuery {
    /// Filtra pelo texto de busca e pagina.
    pub fn apply<T: Searchable>(&self, items: Vec<T>) -> Page<T> {
        let filtered = match self.search.as_deref() {
            Some(needle) => items.into_iter().filter(|item| item.matches(needle)).collect(),
            None => items,
        };
        paginate(
            filtered,
            self.page.unwrap_or(1),
            self.per_page.unwrap_or(DEFAULT_PER_PAGE),
        )
    }
}
