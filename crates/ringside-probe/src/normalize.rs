//! Vendor field-alias normalization
//!
//! SMS providers post the same webhook with different field names. Each
//! logical field has an ordered alias table; the alias with the lowest
//! priority whose value is present and non-empty wins.

use std::collections::HashMap;

use crate::contracts::SmsMessage;

/// A vendor field name and its priority (lower wins)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldAlias {
    pub name: &'static str,
    pub priority: u8,
}

const fn alias(name: &'static str, priority: u8) -> FieldAlias {
    FieldAlias { name, priority }
}

/// Sender aliases
pub const FROM_ALIASES: &[FieldAlias] = &[alias("From", 0), alias("from", 1)];

/// Recipient aliases
pub const TO_ALIASES: &[FieldAlias] = &[alias("To", 0), alias("originalsenderid", 1)];

/// Message body aliases
pub const BODY_ALIASES: &[FieldAlias] = &[alias("Body", 0), alias("message", 1)];

/// Value of the best-priority alias present in `fields`
pub fn resolve_alias<'a>(
    fields: &'a HashMap<String, String>,
    aliases: &[FieldAlias],
) -> Option<&'a str> {
    aliases
        .iter()
        .filter_map(|a| {
            fields
                .get(a.name)
                .filter(|v| !v.is_empty())
                .map(|v| (a.priority, v.as_str()))
        })
        .min_by_key(|(priority, _)| *priority)
        .map(|(_, value)| value)
}

/// Normalize a webhook form into an [`SmsMessage`]
///
/// Missing sender or recipient stay `None`; a missing body becomes `""`.
pub fn normalize_sms(fields: &HashMap<String, String>) -> SmsMessage {
    SmsMessage {
        from: resolve_alias(fields, FROM_ALIASES).map(str::to_string),
        to: resolve_alias(fields, TO_ALIASES).map(str::to_string),
        body: resolve_alias(fields, BODY_ALIASES)
            .unwrap_or_default()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_twilio_fields() {
        let msg = normalize_sms(&form(&[
            ("From", "+19404656984"),
            ("To", "+18175550100"),
            ("Body", "Need a quote"),
        ]));
        assert_eq!(msg, SmsMessage::new("+19404656984", "+18175550100", "Need a quote"));
    }

    #[test]
    fn test_relay_fields() {
        let msg = normalize_sms(&form(&[
            ("from", "+19404656984"),
            ("originalsenderid", "+18175550100"),
            ("message", "pipe burst"),
        ]));
        assert_eq!(msg.from.as_deref(), Some("+19404656984"));
        assert_eq!(msg.to.as_deref(), Some("+18175550100"));
        assert_eq!(msg.body, "pipe burst");
    }

    #[test]
    fn test_higher_priority_alias_wins() {
        let msg = normalize_sms(&form(&[("from", "+2"), ("From", "+1")]));
        assert_eq!(msg.from.as_deref(), Some("+1"));
    }

    #[test]
    fn test_empty_value_falls_through() {
        let msg = normalize_sms(&form(&[("From", ""), ("from", "+2"), ("Body", "")]));
        assert_eq!(msg.from.as_deref(), Some("+2"));
        assert_eq!(msg.body, "");
    }

    #[test]
    fn test_missing_fields() {
        let msg = normalize_sms(&HashMap::new());
        assert_eq!(msg.from, None);
        assert_eq!(msg.to, None);
        assert_eq!(msg.body, "");
    }

    #[test]
    fn test_priority_not_declaration_order() {
        const REVERSED: &[FieldAlias] = &[alias("b", 1), alias("a", 0)];
        let fields = form(&[("a", "first"), ("b", "second")]);
        assert_eq!(resolve_alias(&fields, REVERSED), Some("first"));
    }
}
