//! Provider extension fields carried as custom headers.

/// Every extension field the assembler recognizes.
///
/// Each field is supplied on the source message as a custom header whose
/// name is the provider field name (matched case-insensitively).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionField {
    /// `auto_html`: tri-state.
    AutoHtml,
    /// `auto_text`: tri-state.
    AutoText,
    /// `bcc_address`: text.
    BccAddress,
    /// `global_merge_vars`: raw value, JSON text accepted.
    GlobalMergeVars,
    /// `important`: two-valued flag.
    Important,
    /// `inline_css`: tri-state.
    InlineCss,
    /// `merge`: tri-state.
    Merge,
    /// `merge_language`: text.
    MergeLanguage,
    /// `merge_vars`: raw value.
    MergeVars,
    /// `metadata`: raw value.
    Metadata,
    /// `preserve_recipients`: tri-state.
    PreserveRecipients,
    /// `return_path_domain`: text.
    ReturnPathDomain,
    /// `send_at`: raw value, formatted as a UTC timestamp.
    SendAt,
    /// `signing_domain`: text.
    SigningDomain,
    /// `subaccount`: text.
    Subaccount,
    /// `tags`: comma-separated list.
    Tags,
    /// `template`: text, selects the template endpoint.
    Template,
    /// `template_content`: raw value.
    TemplateContent,
    /// `track_clicks`: tri-state.
    TrackClicks,
    /// `track_opens`: tri-state.
    TrackOpens,
    /// `tracking_domain`: text.
    TrackingDomain,
    /// `url_strip_qs`: tri-state.
    UrlStripQs,
    /// `view_content_link`: tri-state.
    ViewContentLink,
}

impl ExtensionField {
    /// All recognized fields.
    pub const ALL: [Self; 23] = [
        Self::AutoHtml,
        Self::AutoText,
        Self::BccAddress,
        Self::GlobalMergeVars,
        Self::Important,
        Self::InlineCss,
        Self::Merge,
        Self::MergeLanguage,
        Self::MergeVars,
        Self::Metadata,
        Self::PreserveRecipients,
        Self::ReturnPathDomain,
        Self::SendAt,
        Self::SigningDomain,
        Self::Subaccount,
        Self::Tags,
        Self::Template,
        Self::TemplateContent,
        Self::TrackClicks,
        Self::TrackOpens,
        Self::TrackingDomain,
        Self::UrlStripQs,
        Self::ViewContentLink,
    ];

    /// Name of the header carrying this field.
    #[must_use]
    pub const fn header_name(self) -> &'static str {
        match self {
            Self::AutoHtml => "auto_html",
            Self::AutoText => "auto_text",
            Self::BccAddress => "bcc_address",
            Self::GlobalMergeVars => "global_merge_vars",
            Self::Important => "important",
            Self::InlineCss => "inline_css",
            Self::Merge => "merge",
            Self::MergeLanguage => "merge_language",
            Self::MergeVars => "merge_vars",
            Self::Metadata => "metadata",
            Self::PreserveRecipients => "preserve_recipients",
            Self::ReturnPathDomain => "return_path_domain",
            Self::SendAt => "send_at",
            Self::SigningDomain => "signing_domain",
            Self::Subaccount => "subaccount",
            Self::Tags => "tags",
            Self::Template => "template",
            Self::TemplateContent => "template_content",
            Self::TrackClicks => "track_clicks",
            Self::TrackOpens => "track_opens",
            Self::TrackingDomain => "tracking_domain",
            Self::UrlStripQs => "url_strip_qs",
            Self::ViewContentLink => "view_content_link",
        }
    }

    /// How the field's header value is read.
    #[must_use]
    pub const fn reader(self) -> FieldReader {
        match self {
            Self::AutoHtml
            | Self::AutoText
            | Self::InlineCss
            | Self::Merge
            | Self::PreserveRecipients
            | Self::TrackClicks
            | Self::TrackOpens
            | Self::UrlStripQs
            | Self::ViewContentLink => FieldReader::TriState,
            Self::Important => FieldReader::Flag,
            Self::GlobalMergeVars
            | Self::MergeVars
            | Self::Metadata
            | Self::SendAt
            | Self::TemplateContent => FieldReader::Raw,
            Self::Tags => FieldReader::List,
            Self::BccAddress
            | Self::MergeLanguage
            | Self::ReturnPathDomain
            | Self::SigningDomain
            | Self::Subaccount
            | Self::Template
            | Self::TrackingDomain => FieldReader::Text,
        }
    }
}

/// Which view of a header a field is read through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldReader {
    /// Formatted text compared against `"true"`; absent stays absent.
    TriState,
    /// Formatted text compared against `"true"`; absent is `false`.
    Flag,
    /// Formatted text, or null.
    Text,
    /// Formatted text split on `", "`.
    List,
    /// Original, unformatted value.
    Raw,
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_header_names_are_unique() {
        let names: HashSet<_> = ExtensionField::ALL
            .iter()
            .map(|field| field.header_name())
            .collect();
        assert_eq!(names.len(), ExtensionField::ALL.len());
    }

    #[test]
    fn test_reader_kinds() {
        let tri_states = ExtensionField::ALL
            .iter()
            .filter(|field| field.reader() == FieldReader::TriState)
            .count();
        assert_eq!(tri_states, 9);
        assert_eq!(ExtensionField::Important.reader(), FieldReader::Flag);
        assert_eq!(ExtensionField::SendAt.reader(), FieldReader::Raw);
        assert_eq!(ExtensionField::Tags.reader(), FieldReader::List);
    }
}
