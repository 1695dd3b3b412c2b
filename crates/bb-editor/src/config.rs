/// Routing and naming knobs shared by the editor and preview sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorConfig {
    /// Name of the page created when nothing was saved.
    pub default_page_name: String,
    /// Query parameter carrying the encoded page.
    pub query_param: String,
    pub preview_path: String,
    pub editor_path: String,
    /// Page name shown by the preview when no data was passed.
    pub no_data_page_name: String,
    /// Page name shown by the preview when the data could not be decoded.
    pub error_page_name: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_page_name: "New Page".into(),
            query_param: "data".into(),
            preview_path: "/preview".into(),
            editor_path: "/".into(),
            no_data_page_name: "No data provided".into(),
            error_page_name: "Error loading page".into(),
        }
    }
}

impl EditorConfig {
    /// `{path}?{param}={encoded}`.
    pub fn link(&self, path: &str, encoded: &str) -> String {
        format!("{path}?{}={encoded}", self.query_param)
    }
}
