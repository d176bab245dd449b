use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ConfigKind {
    Sector,
    PaymentType,
    Category,
}

impl ConfigKind {
    pub const ALL: [ConfigKind; 3] = [
        ConfigKind::Sector,
        ConfigKind::PaymentType,
        ConfigKind::Category,
    ];
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKind::Sector => write!(f, "setor"),
            ConfigKind::PaymentType => write!(f, "pagamento"),
            ConfigKind::Category => write!(f, "categoria"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigItem {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0}: o nome não pode ser vazio")]
    EmptyName(ConfigKind),
}

/// Local mirror of the three configuration lists.
///
/// Lists are only touched after the backend confirmed the change; failures
/// are kept per kind so one broken list does not hide the others.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfigBoard {
    lists: BTreeMap<ConfigKind, Vec<ConfigItem>>,
    errors: BTreeMap<ConfigKind, String>,
}

impl ConfigBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trims and rejects blank names before any request is made.
    pub fn prepare_name(kind: ConfigKind, raw: &str) -> Result<String, ConfigError> {
        let name = raw.trim();
        if name.is_empty() {
            Err(ConfigError::EmptyName(kind))
        } else {
            Ok(name.to_string())
        }
    }

    pub fn load(&mut self, kind: ConfigKind, items: Vec<ConfigItem>) {
        self.lists.insert(kind, items);
        self.errors.remove(&kind);
    }

    /// Inserts or replaces the item with the same id.
    pub fn apply_saved(&mut self, kind: ConfigKind, item: ConfigItem) {
        let list = self.lists.entry(kind).or_default();
        match list.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => existing.name = item.name,
            None => list.push(item),
        }
        self.errors.remove(&kind);
    }

    pub fn apply_deleted(&mut self, kind: ConfigKind, id: u64) {
        if let Some(list) = self.lists.get_mut(&kind) {
            list.retain(|item| item.id != id);
        }
        self.errors.remove(&kind);
    }

    pub fn fail(&mut self, kind: ConfigKind, message: impl Into<String>) {
        self.errors.insert(kind, message.into());
    }

    pub fn items(&self, kind: ConfigKind) -> &[ConfigItem] {
        self.lists.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn error(&self, kind: ConfigKind) -> Option<&str> {
        self.errors.get(&kind).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64, name: &str) -> ConfigItem {
        ConfigItem {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn blank_names_are_rejected() {
        assert_eq!(
            ConfigBoard::prepare_name(ConfigKind::Sector, "   "),
            Err(ConfigError::EmptyName(ConfigKind::Sector))
        );
        assert_eq!(
            ConfigBoard::prepare_name(ConfigKind::Category, "  Classe I "),
            Ok("Classe I".to_string())
        );
    }

    #[test]
    fn saved_items_append_or_replace() {
        let mut board = ConfigBoard::new();
        board.load(ConfigKind::Sector, vec![item(1, "Pátio")]);
        board.apply_saved(ConfigKind::Sector, item(2, "Balança"));
        board.apply_saved(ConfigKind::Sector, item(1, "Pátio Norte"));
        assert_eq!(
            board.items(ConfigKind::Sector),
            &[item(1, "Pátio Norte"), item(2, "Balança")]
        );
    }

    #[test]
    fn errors_are_kept_per_kind() {
        let mut board = ConfigBoard::new();
        board.load(ConfigKind::PaymentType, vec![item(1, "Pix")]);
        board.fail(ConfigKind::Category, "HTTP 500: Internal Server Error");

        assert_eq!(board.error(ConfigKind::PaymentType), None);
        assert_eq!(
            board.error(ConfigKind::Category),
            Some("HTTP 500: Internal Server Error")
        );

        board.apply_deleted(ConfigKind::PaymentType, 1);
        assert!(board.items(ConfigKind::PaymentType).is_empty());
        assert!(board.items(ConfigKind::Sector).is_empty());
    }
}
