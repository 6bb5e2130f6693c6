use tracing::trace;

/// Fields captured from one image reference.
///
/// Parts absent from the source string are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageReference {
    pub registry: String,
    pub org: String,
    pub repo: String,
    pub tag: String,
    pub shasum: String,
}

/// Which parts of a reference to drop when rendering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrimOptions {
    /// Render only `org/repo`
    pub minimal: bool,
    pub trim_registry: bool,
    pub trim_sha256: bool,
    pub trim_tag: bool,
}

impl TrimOptions {
    /// Trimming all three parts is the same as `minimal`
    fn is_minimal(&self) -> bool {
        self.minimal || (self.trim_registry && self.trim_sha256 && self.trim_tag)
    }
}

impl ImageReference {
    /// Renders the reference with the parts selected by `options` removed.
    ///
    /// | trim_registry | trim_sha256 | trim_tag | output                                |
    /// |---------------|-------------|----------|---------------------------------------|
    /// | true          | true        | –        | `org/repo:tag`                        |
    /// | true          | false       | true     | `org/repo@sha256:shasum`              |
    /// | true          | false       | false    | `org/repo:tag@sha256:shasum`          |
    /// | false         | true        | true     | `registry/org/repo`                   |
    /// | false         | true        | false    | `registry/org/repo:tag`               |
    /// | false         | false       | true     | `registry/org/repo@sha256:shasum`     |
    /// | false         | false       | false    | `registry/org/repo:tag@sha256:shasum` |
    ///
    /// `minimal`, or all three trims at once, yields `org/repo`. Empty fields
    /// are rendered as-is, so a reference without a tag keeps its `:`.
    pub fn render(&self, options: &TrimOptions) -> String {
        trace!("trim options: {:?}", options);

        let name = format!("{}/{}", self.org, self.repo);

        if options.is_minimal() {
            trace!("returning minimal reference");
            return name;
        }

        let name = if options.trim_registry {
            name
        } else {
            format!("{}/{}", self.registry, name)
        };

        match (options.trim_registry, options.trim_sha256, options.trim_tag) {
            (true, true, _) => format!("{}:{}", name, self.tag),
            (_, true, true) => name,
            (_, true, false) => format!("{}:{}", name, self.tag),
            (_, false, true) => format!("{}@sha256:{}", name, self.shasum),
            (_, false, false) => format!("{}:{}@sha256:{}", name, self.tag, self.shasum),
        }
    }
}
