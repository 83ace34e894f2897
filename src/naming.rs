//! Action names, categories and display names derived from paths.

use std::collections::{HashMap, HashSet};

/// Prefix shared by every LaunchDarkly REST path.
pub const DEFAULT_PATH_PREFIX: &str = "/api/v2";

/// Literal (non-`{param}`) segments of `path` once `prefix` is stripped.
pub fn literal_segments<'a>(path: &'a str, prefix: &str) -> Vec<&'a str> {
    let prefix = prefix.trim_end_matches('/');
    let rest = match path.strip_prefix(prefix) {
        Some(rest) if !prefix.is_empty() && (rest.is_empty() || rest.starts_with('/')) => rest,
        _ => path,
    };
    rest.split('/')
        .filter(|s| !s.is_empty() && !(s.starts_with('{') && s.ends_with('}')))
        .collect()
}

/// Names of the `{param}` placeholders in `path`, in order.
pub fn path_placeholders(path: &str) -> Vec<&str> {
    path.split('/')
        .filter_map(|s| s.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Verb for an HTTP method; GET splits into `list` and `get` on segment count.
pub fn action_verb(method: &str, literal_count: usize) -> Option<&'static str> {
    match method.to_ascii_uppercase().as_str() {
        "GET" if literal_count > 1 => Some("get"),
        "GET" => Some("list"),
        "POST" => Some("create"),
        "PUT" | "PATCH" => Some("update"),
        "DELETE" => Some("delete"),
        _ => None,
    }
}

/// `patch /api/v2/flags/{projectKey}/{flagKey}` → `updateFlags`.
pub fn base_action_name(method: &str, path: &str, prefix: &str) -> Option<String> {
    let segments = literal_segments(path, prefix);
    let verb = action_verb(method, segments.len())?;
    let mut name = verb.to_string();
    for segment in segments {
        name.push_str(&pascal_case(segment));
    }
    Some(name)
}

/// Split an identifier into words on case changes and non-alphanumerics.
///
/// `getHTTPStatus` → `get`, `HTTP`, `Status`; `feature-flags` → `feature`, `flags`.
pub fn split_words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && i > 0 && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// `feature-flags` → `FeatureFlags`
pub fn pascal_case(s: &str) -> String {
    split_words(s).iter().map(|w| capitalize(w)).collect()
}

/// `environment-key` → `environmentKey`
pub fn camel_case(s: &str) -> String {
    let words = split_words(s);
    let mut out = String::with_capacity(s.len());
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(&word.to_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// `projectKey` → `Project Key`
pub fn display_name(field: &str) -> String {
    let words: Vec<String> = split_words(field).iter().map(|w| capitalize(w)).collect();
    if words.is_empty() {
        field.to_string()
    } else {
        words.join(" ")
    }
}

/// Kebab-case slug used for category directories.
pub fn slugify(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            result.push(c.to_ascii_lowercase());
        } else if !result.is_empty() && !result.ends_with('-') {
            result.push('-');
        }
    }
    while result.ends_with('-') {
        result.pop();
    }
    if result.is_empty() {
        "other".to_string()
    } else {
        result
    }
}

/// Category from the operation's first tag, else its first literal segment.
pub fn category(tag: Option<&str>, path: &str, prefix: &str) -> String {
    if let Some(tag) = tag.map(str::trim).filter(|t| !t.is_empty()) {
        return tag.to_string();
    }
    literal_segments(path, prefix)
        .first()
        .map(|segment| display_name(segment))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Other".to_string())
}

/// Hands out collision-free action names in encounter order.
///
/// The first occurrence of a base name is returned unchanged, later ones get
/// `2`, `3`, ... appended.
#[derive(Debug, Default)]
pub struct NameRegistry {
    counts: HashMap<String, usize>,
    issued: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, base: &str) -> String {
        loop {
            let count = self.counts.entry(base.to_string()).or_default();
            *count += 1;
            let candidate = if *count == 1 {
                base.to_string()
            } else {
                format!("{base}{count}")
            };
            // A literal base like `listItems2` may already hold the suffixed name.
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- literal_segments --

    #[test]
    fn literal_segments_strips_prefix_and_params() {
        assert_eq!(
            literal_segments("/api/v2/projects/{projectKey}/flags/{flagKey}", "/api/v2"),
            ["projects", "flags"]
        );
    }

    #[test]
    fn literal_segments_without_prefix() {
        assert_eq!(literal_segments("/projects", "/api/v2"), ["projects"]);
        assert_eq!(literal_segments("/api/v2/teams", ""), ["api", "v2", "teams"]);
    }

    #[test]
    fn literal_segments_requires_segment_boundary() {
        assert_eq!(literal_segments("/api/v2beta/x", "/api/v2"), ["api", "v2beta", "x"]);
    }

    #[test]
    fn path_placeholders_in_order() {
        assert_eq!(
            path_placeholders("/api/v2/flags/{projectKey}/{featureFlagKey}"),
            ["projectKey", "featureFlagKey"]
        );
    }

    // -- action_verb --

    #[test]
    fn get_with_one_segment_is_list() {
        assert_eq!(action_verb("get", 1), Some("list"));
        assert_eq!(action_verb("GET", 0), Some("list"));
    }

    #[test]
    fn get_with_several_segments_is_get() {
        assert_eq!(action_verb("get", 2), Some("get"));
    }

    #[test]
    fn mutating_verbs() {
        assert_eq!(action_verb("post", 1), Some("create"));
        assert_eq!(action_verb("put", 3), Some("update"));
        assert_eq!(action_verb("patch", 1), Some("update"));
        assert_eq!(action_verb("delete", 2), Some("delete"));
        assert_eq!(action_verb("head", 1), None);
    }

    // -- base_action_name --

    #[test]
    fn base_action_name_examples() {
        assert_eq!(
            base_action_name("get", "/api/v2/projects", DEFAULT_PATH_PREFIX).as_deref(),
            Some("listProjects")
        );
        assert_eq!(
            base_action_name("post", "/api/v2/teams", DEFAULT_PATH_PREFIX).as_deref(),
            Some("createTeams")
        );
        assert_eq!(
            base_action_name(
                "patch",
                "/api/v2/projects/{projectKey}/flags/{flagKey}",
                DEFAULT_PATH_PREFIX
            )
            .as_deref(),
            Some("updateProjectsFlags")
        );
        assert_eq!(
            base_action_name(
                "get",
                "/api/v2/flag-links/projects/{projectKey}",
                DEFAULT_PATH_PREFIX
            )
            .as_deref(),
            Some("getFlagLinksProjects")
        );
        assert_eq!(
            base_action_name("options", "/api/v2/teams", DEFAULT_PATH_PREFIX),
            None
        );
    }

    // -- case helpers --

    #[test]
    fn split_words_handles_acronyms() {
        assert_eq!(split_words("getHTTPStatus"), ["get", "HTTP", "Status"]);
        assert_eq!(split_words("HTMLParser"), ["HTML", "Parser"]);
        assert_eq!(split_words("feature_flag-key"), ["feature", "flag", "key"]);
        assert_eq!(split_words(""), Vec::<String>::new());
    }

    #[test]
    fn case_conversions() {
        assert_eq!(pascal_case("feature-flags"), "FeatureFlags");
        assert_eq!(camel_case("environment-key"), "environmentKey");
        assert_eq!(camel_case("ProjectKey"), "projectKey");
        assert_eq!(display_name("projectKey"), "Project Key");
        assert_eq!(display_name("_id"), "Id");
    }

    #[test]
    fn slugify_categories() {
        assert_eq!(slugify("Feature flags"), "feature-flags");
        assert_eq!(slugify("Code references (beta)"), "code-references-beta");
        assert_eq!(slugify("///"), "other");
    }

    #[test]
    fn category_prefers_tag() {
        assert_eq!(
            category(Some("Feature flags"), "/api/v2/flags/{p}", DEFAULT_PATH_PREFIX),
            "Feature flags"
        );
        assert_eq!(
            category(None, "/api/v2/audit-log", DEFAULT_PATH_PREFIX),
            "Audit Log"
        );
        assert_eq!(category(Some("  "), "/api/v2", DEFAULT_PATH_PREFIX), "Other");
    }

    // -- NameRegistry --

    #[test]
    fn registry_suffixes_duplicates_in_encounter_order() {
        let mut registry = NameRegistry::new();
        assert_eq!(registry.register("listProjects"), "listProjects");
        assert_eq!(registry.register("listProjects"), "listProjects2");
        assert_eq!(registry.register("createTeams"), "createTeams");
        assert_eq!(registry.register("listProjects"), "listProjects3");
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn registry_skips_names_already_issued() {
        let mut registry = NameRegistry::new();
        assert_eq!(registry.register("listItems2"), "listItems2");
        assert_eq!(registry.register("listItems"), "listItems");
        assert_eq!(registry.register("listItems"), "listItems3");
    }
}
