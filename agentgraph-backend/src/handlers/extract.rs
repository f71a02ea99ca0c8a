//! Field extraction from raw agent output.
//!
//! Agents are prompted to emit `key: value` lines; handlers pull the fields
//! they need out of the unstructured text with these helpers.

use regex::Regex;

/// Extract the first whitespace-delimited value following `target:`.
/// Matching is case-insensitive.
pub fn extract_string(input: &str, target: &str) -> Result<String, String> {
    let pattern = format!(r"(?i){}:\s*(\S+)", regex::escape(target));
    let re = Regex::new(&pattern).map_err(|e| format!("invalid field pattern: {}", e))?;
    re.captures(input)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| format!("failed to find {}", target))
}

/// Extract a comma-separated list following `target:`, trimmed per element.
pub fn extract_array(input: &str, target: &str) -> Result<Vec<String>, String> {
    let pattern = format!(r"(?i){}:\s*([^\n]+)", regex::escape(target));
    let re = Regex::new(&pattern).map_err(|e| format!("invalid field pattern: {}", e))?;
    let caps = re
        .captures(input)
        .ok_or_else(|| format!("failed to find {}", target))?;
    Ok(caps[1]
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_string_basic() {
        let output = "Decision made.\nproposalId: 42\nI Agree.";
        assert_eq!(extract_string(output, "proposalId").unwrap(), "42");
    }

    #[test]
    fn test_extract_string_case_insensitive() {
        let output = "PROPOSALID: abc-7";
        assert_eq!(extract_string(output, "proposalId").unwrap(), "abc-7");
    }

    #[test]
    fn test_extract_string_missing() {
        assert!(extract_string("no fields here", "proposalId").is_err());
    }

    #[test]
    fn test_extract_array() {
        let output = "contributors: 0xaa, 0xbb,0xcc\nallocatedAmounts: 10, 20, 30";
        assert_eq!(
            extract_array(output, "contributors").unwrap(),
            vec!["0xaa", "0xbb", "0xcc"]
        );
        assert_eq!(
            extract_array(output, "allocatedAmounts").unwrap(),
            vec!["10", "20", "30"]
        );
    }

    #[test]
    fn test_extract_array_missing() {
        assert!(extract_array("nothing", "contributors").is_err());
    }
}
