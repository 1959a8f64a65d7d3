use nsdoc_index::UrlResolver;

/// Expands `{entry}` / `{path}` placeholders into a link for an entry
pub struct TemplateResolver {
    template: String,
    separator: char,
}

impl TemplateResolver {
    pub fn new(template: impl Into<String>, separator: char) -> Self {
        Self {
            template: template.into(),
            separator,
        }
    }
}

impl UrlResolver for TemplateResolver {
    fn entry_url(&self, entry: &str) -> String {
        let path = entry.replace(self.separator, "/");
        self.template
            .replace("{entry}", entry)
            .replace("{path}", &path)
    }
}
