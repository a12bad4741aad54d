// src/common/i18n.rs

use std::collections::HashMap;

use anyhow::Context;

// Idioma usado quando a chave não existe no idioma pedido.
const FALLBACK_LANG: &str = "pt";

const LOCALES: [(&str, &str); 2] = [
    ("pt", include_str!("../../locales/pt.json")),
    ("en", include_str!("../../locales/en.json")),
];

/// Catálogo de mensagens por idioma, carregado dos arquivos em `locales/`.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut messages = HashMap::new();
        for (lang, raw) in LOCALES {
            let table: HashMap<String, String> = serde_json::from_str(raw)
                .with_context(|| format!("Arquivo de idioma '{}' inválido", lang))?;
            messages.insert(lang.to_string(), table);
        }
        Ok(Self { messages })
    }

    /// Busca `key` em `lang`, depois no idioma padrão. Sem tradução, devolve a própria chave.
    pub fn translate(&self, lang: &str, key: &str) -> String {
        [lang, FALLBACK_LANG]
            .iter()
            .find_map(|l| self.messages.get(*l).and_then(|table| table.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    pub fn translate_with(&self, lang: &str, key: &str, args: &[(&str, String)]) -> String {
        args.iter().fold(self.translate(lang, key), |message, (name, value)| {
            message.replace(&format!("{{{}}}", name), value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_locales_define_the_same_keys() {
        let store = I18nStore::load().unwrap();
        let mut pt: Vec<_> = store.messages["pt"].keys().collect();
        let mut en: Vec<_> = store.messages["en"].keys().collect();
        pt.sort();
        en.sort();
        assert_eq!(pt, en);
    }

    #[test]
    fn unknown_language_falls_back_to_portuguese() {
        let store = I18nStore::load().unwrap();
        assert_eq!(store.translate("de", "EMPTY_ITEMS"), store.translate("pt", "EMPTY_ITEMS"));
        assert_eq!(store.translate("en", "no.such.key"), "no.such.key");
    }

    #[test]
    fn placeholders_are_replaced() {
        let store = I18nStore::load().unwrap();
        let msg = store.translate_with("en", "RESOURCE_NOT_FOUND", &[("resource", "Order".into())]);
        assert_eq!(msg, "Order not found.");
    }
}
