//! Export actions
//!
//! An action turns a selection made in a record listing into a redirect to
//! the export endpoint of its channel. The action table is static.

use super::Channel;
use crate::record::ContentType;

/// A named export action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportAction {
    pub name: &'static str,
    pub description: &'static str,
    pub channel: Channel,
    pub format: Option<&'static str>,
}

impl ExportAction {
    /// Redirect target for a selection
    ///
    /// # Arguments
    /// * `content_type` - Record type of the listing
    /// * `selection` - Output of [`selection_query`]
    pub fn redirect_url(&self, content_type: &ContentType, selection: &str) -> String {
        let mut query = format!("{selection}&contenttype={content_type}");
        if let Some(format) = self.format {
            query.push_str(&format!("&format={format}"));
        }
        format!("{}?{}", self.channel.path(), query)
    }
}

pub const SPREADSHEET_EXPORT_ACTIONS: [ExportAction; 2] = [
    ExportAction {
        name: "export_redirect_spreadsheet_csv",
        description: "Export selected to spreadsheet (csv)",
        channel: Channel::Spreadsheet,
        format: Some("csv"),
    },
    ExportAction {
        name: "export_redirect_spreadsheet_xlsx",
        description: "Export selected to spreadsheet (xlsx)",
        channel: Channel::Spreadsheet,
        format: Some("xlsx"),
    },
];

pub const PDF_EXPORT_ACTIONS: [ExportAction; 1] = [ExportAction {
    name: "export_redirect_pdf",
    description: "Export selected to PDF",
    channel: Channel::Pdf,
    format: None,
}];

pub const DATA_EXPORT_ACTIONS: [ExportAction; 2] = [
    ExportAction {
        name: "export_redirect_serializer_json",
        description: "Export selected to JSON",
        channel: Channel::Data,
        format: Some("json"),
    },
    ExportAction {
        name: "export_redirect_serializer_xml",
        description: "Export selected to XML",
        channel: Channel::Data,
        format: Some("xml"),
    },
];

pub const ALL_EXPORT_ACTIONS: [ExportAction; 5] = [
    SPREADSHEET_EXPORT_ACTIONS[0],
    SPREADSHEET_EXPORT_ACTIONS[1],
    PDF_EXPORT_ACTIONS[0],
    DATA_EXPORT_ACTIONS[0],
    DATA_EXPORT_ACTIONS[1],
];

/// Look up an action by name
pub fn find_action(name: &str) -> Option<&'static ExportAction> {
    ALL_EXPORT_ACTIONS.iter().find(|a| a.name == name)
}

/// Selection part of an export redirect
///
/// # Arguments
/// * `selected` - Ids of the checked rows
/// * `matching` - Ids of the records the action applies to
/// * `total` - Number of records of the type
///
/// When the action covers a different set than the checked rows (a "select
/// all" across pages), the whole type is requested if the set is complete, or
/// the matching ids otherwise.
pub fn selection_query(selected: &[String], matching: &[String], total: usize) -> String {
    if matching.len() != selected.len() {
        if matching.len() == total {
            "query=all".to_string()
        } else {
            format!("query={}", matching.join("+"))
        }
    } else {
        format!("query={}", selected.join("+"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_action_table() {
        let names: Vec<&str> = ALL_EXPORT_ACTIONS.iter().map(|a| a.name).collect();
        assert_eq!(
            names,
            vec![
                "export_redirect_spreadsheet_csv",
                "export_redirect_spreadsheet_xlsx",
                "export_redirect_pdf",
                "export_redirect_serializer_json",
                "export_redirect_serializer_xml",
            ]
        );
        assert_eq!(find_action("export_redirect_pdf").unwrap().channel, Channel::Pdf);
        assert!(find_action("export_redirect_data_yaml").is_none());
    }

    #[test]
    fn test_selection_uses_checked_rows() {
        assert_eq!(
            selection_query(&ids(&["3", "5"]), &ids(&["3", "5"]), 10),
            "query=3+5"
        );
    }

    #[test]
    fn test_selection_across_pages() {
        let all: Vec<String> = (1..=4).map(|i| i.to_string()).collect();
        assert_eq!(selection_query(&ids(&["1"]), &all, 4), "query=all");
        assert_eq!(selection_query(&ids(&["1"]), &all, 9), "query=1+2+3+4");
    }

    #[test]
    fn test_redirect_url() {
        let ct = ContentType::new("library", "book");
        let action = find_action("export_redirect_spreadsheet_xlsx").unwrap();
        assert_eq!(
            action.redirect_url(&ct, "query=all"),
            "/export/spreadsheet/?query=all&contenttype=library.book&format=xlsx"
        );

        let pdf = find_action("export_redirect_pdf").unwrap();
        assert_eq!(
            pdf.redirect_url(&ct, "query=1+2"),
            "/export/pdf/?query=1+2&contenttype=library.book"
        );
    }
}
