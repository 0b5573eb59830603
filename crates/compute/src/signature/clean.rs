//! Field-name and literal-value normalization.

use std::sync::OnceLock;

use regex::Regex;

/// File extensions stripped from the end of values, checked in order.
const FILE_EXTENSIONS: &[&str] = &[
    // Executables
    ".exe", ".dll", ".sys", ".drv", ".ocx", ".cpl", ".scr", ".com", ".pif",
    // Scripts
    ".bat", ".cmd", ".ps1", ".psm1", ".psd1", ".vbs", ".vbe", ".js", ".jse",
    ".wsh", ".wsf", ".hta", ".py", ".pl", ".php", ".rb", ".sh",
    // Archives
    ".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz", ".cab", ".msi",
    // Documents
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".rtf",
    // Logs and config
    ".txt", ".log", ".cfg", ".conf", ".ini", ".xml", ".json", ".yaml", ".yml",
    // Images
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".ico", ".svg",
    // Leftovers
    ".tmp", ".temp", ".bak", ".old", ".orig",
];

/// Block names that carry no field meaning on their own.
const STRUCTURAL_KEYS: &[&str] = &["selection", "filter", "condition", "timeframe", "keywords"];

/// Prefixes stripped from block names, first match wins.
const STRUCTURAL_PREFIXES: &[&str] = &[
    "selection_", "sel_", "select_",
    "filter_", "filt_", "exclude_",
    "keyword_", "pattern_", "rule_",
    "detection_", "detect_", "match_", "search_",
];

/// Suffixes stripped from block names when no prefix matched.
const STRUCTURAL_SUFFIXES: &[&str] = &["_selection", "_filter", "_condition", "_rule"];

fn numeric_suffix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_?\d+$").expect("valid regex"))
}

fn field_metachars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[*?\[\]{}()^$|\\]").expect("valid regex"))
}

fn repeated_underscores() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_+").expect("valid regex"))
}

fn separators_and_quotes() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"[\\/'"]+"#).expect("valid regex"))
}

fn whitespace_runs() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid regex"))
}

/// Normalize a detection key into a field name.
///
/// Returns `None` for pure structural block names (`selection`, `filter2`,
/// ...), which are not fields at all. Any other key that cleans down to
/// nothing falls back to the raw key.
pub fn clean_field(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_lowercase();

    // Image|endswith -> image
    let unmodified = lowered.split('|').next().unwrap_or_default();
    let unnumbered = numeric_suffix().replace(unmodified, "");
    let base: &str = &unnumbered;

    if STRUCTURAL_KEYS.contains(&base) {
        return None;
    }

    let mut cleaned = base;
    if let Some(rest) = STRUCTURAL_PREFIXES
        .iter()
        .find_map(|prefix| cleaned.strip_prefix(prefix))
    {
        cleaned = rest;
    } else if let Some(rest) = STRUCTURAL_SUFFIXES
        .iter()
        .find_map(|suffix| cleaned.strip_suffix(suffix))
    {
        cleaned = rest;
    }

    let cleaned = field_metachars().replace_all(cleaned, "");
    let cleaned = repeated_underscores().replace_all(&cleaned, "_");
    let cleaned = cleaned.trim_matches('_');

    if cleaned.is_empty() {
        Some(raw.to_string())
    } else {
        Some(cleaned.to_string())
    }
}

/// Normalize a literal value for fuzzy comparison.
///
/// Lowercases, drops path separators and quotes, collapses whitespace and
/// strips known file extensions until none is left. A value that cleans down
/// to nothing is returned unchanged. The result is a fixed point:
/// `clean_value(&clean_value(x)) == clean_value(x)`.
pub fn clean_value(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped = separators_and_quotes().replace_all(&lowered, "");
    let collapsed = whitespace_runs().replace_all(&stripped, " ");

    let mut cleaned = collapsed.trim();
    while let Some(rest) = FILE_EXTENSIONS
        .iter()
        .find_map(|ext| cleaned.strip_suffix(ext))
    {
        cleaned = rest.trim_end();
    }

    if cleaned.is_empty() {
        raw.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_modifiers_are_stripped() {
        assert_eq!(clean_field("Image|endswith").as_deref(), Some("image"));
        assert_eq!(clean_field("CommandLine|contains|all").as_deref(), Some("commandline"));
        assert_eq!(clean_field("EventID").as_deref(), Some("eventid"));
    }

    #[test]
    fn structural_block_names_are_not_fields() {
        for key in ["selection", "filter", "condition", "keywords", "timeframe", "selection1", "filter_2"] {
            assert_eq!(clean_field(key), None, "{key}");
        }
    }

    #[test]
    fn structural_prefixes_and_suffixes_are_stripped() {
        assert_eq!(clean_field("selection_img").as_deref(), Some("img"));
        assert_eq!(clean_field("sel_parent").as_deref(), Some("parent"));
        assert_eq!(clean_field("filter_main_generic").as_deref(), Some("main_generic"));
        assert_eq!(clean_field("cli_selection").as_deref(), Some("cli"));
        assert_eq!(clean_field("proc_filter").as_deref(), Some("proc"));
    }

    #[test]
    fn metachars_and_underscores_are_normalized() {
        assert_eq!(clean_field("Target*Name?").as_deref(), Some("targetname"));
        assert_eq!(clean_field("a__b___c").as_deref(), Some("a_b_c"));
        assert_eq!(clean_field("_leading_").as_deref(), Some("leading"));
    }

    #[test]
    fn empty_field_falls_back_to_raw_key() {
        assert_eq!(clean_field("__").as_deref(), Some("__"));
        assert_eq!(clean_field("*").as_deref(), Some("*"));
    }

    #[test]
    fn value_extensions_and_paths_are_stripped() {
        assert_eq!(clean_value("\\PowerShell.EXE"), "powershell");
        assert_eq!(clean_value("C:\\Windows\\System32\\cmd.exe"), "c:windowssystem32cmd");
        assert_eq!(clean_value("'quoted'  text"), "quoted text");
        assert_eq!(clean_value("payload.tar.gz"), "payload");
        assert_eq!(clean_value("4688"), "4688");
    }

    #[test]
    fn value_that_cleans_to_nothing_is_kept_raw() {
        assert_eq!(clean_value(".exe"), ".exe");
        assert_eq!(clean_value("\\\\"), "\\\\");
    }

    #[test]
    fn value_cleaning_is_idempotent() {
        let samples = [
            "\\PowerShell.EXE",
            "payload.tar.gz",
            "a .exe",
            ".exe",
            "  ",
            "x.ex\\e",
            "Mixed  Case\tWith\nBreaks.LOG",
            "'\"/\\",
            "report.pdf.exe.zip",
            "İstanbul.txt",
        ];
        for sample in samples {
            let once = clean_value(sample);
            assert_eq!(clean_value(&once), once, "input {sample:?}");
        }
    }
}
