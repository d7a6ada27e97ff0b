use std::path::{Path, PathBuf};

/// Expand `~`, `$VAR` and `${VAR}` in a path. Unresolvable variables leave
/// the path unchanged.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    shellexpand::full(&raw)
        .map(|s| PathBuf::from(s.into_owned()))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Survey ids become directory names; reject anything that would leave the data dir.
pub fn is_safe_survey_id(survey: &str) -> bool {
    !survey.is_empty()
        && survey != "."
        && survey != ".."
        && !survey.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path_is_unchanged() {
        assert_eq!(expand_path(Path::new("surveys/123")), PathBuf::from("surveys/123"));
    }

    #[test]
    fn test_unknown_variable_leaves_path() {
        let path = Path::new("$SURVEYKIT_SURELY_UNSET_VAR/x");
        assert_eq!(expand_path(path), path.to_path_buf());
    }

    #[test]
    fn test_survey_id_safety() {
        assert!(is_safe_survey_id("123456"));
        assert!(!is_safe_survey_id("../etc"));
        assert!(!is_safe_survey_id(".."));
        assert!(!is_safe_survey_id(""));
    }
}
