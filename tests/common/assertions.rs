/// Command line and output tree assertion utilities
use std::path::Path;

/// Check that a rendered command contains a fragment
#[allow(dead_code)]
pub fn assert_cmd_contains(cmd: &str, flag: &str) {
    assert!(
        cmd.contains(flag),
        "Expected command to contain '{}' but it didn't.\nCommand: {}",
        flag,
        cmd
    );
}

/// Check if a command string does NOT contain a specific flag
#[allow(dead_code)]
pub fn assert_cmd_not_contains(cmd: &str, flag: &str) {
    assert!(
        !cmd.contains(flag),
        "Expected command to NOT contain '{}' but it did.\nCommand: {}",
        flag,
        cmd
    );
}

/// Check if a command contains a flag with a specific value
#[allow(dead_code)]
pub fn assert_cmd_has_flag_value(cmd: &str, flag: &str, value: &str) {
    let pattern = format!("{} {}", flag, value);
    assert!(
        cmd.contains(&pattern),
        "Expected command to contain '{} {}' but it didn't.\nCommand: {}",
        flag,
        value,
        cmd
    );
}

/// Parse a flag value from the command (e.g., get "23" from "-crf 23")
#[allow(dead_code)]
pub fn get_flag_value<'a>(cmd: &'a str, flag: &str) -> Option<&'a str> {
    let pattern = format!(" {} ", flag);
    cmd.find(&pattern).and_then(|pos| {
        let after_flag = &cmd[pos + pattern.len()..];
        after_flag.split_whitespace().next()
    })
}

/// Every path must exist
#[allow(dead_code)]
pub fn assert_all_exist<P: AsRef<Path>>(paths: &[P]) {
    for path in paths {
        let path = path.as_ref();
        assert!(path.exists(), "Expected {} to exist", path.display());
    }
}

/// No path may exist
#[allow(dead_code)]
pub fn assert_none_exist<P: AsRef<Path>>(paths: &[P]) {
    for path in paths {
        let path = path.as_ref();
        assert!(!path.exists(), "Expected {} to be absent", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_flag_value() {
        let cmd = "ffmpeg -i input.mp4 -crf 23 -b:a 128k output.mp4";
        assert_eq!(get_flag_value(cmd, "-crf"), Some("23"));
        assert_eq!(get_flag_value(cmd, "-b:a"), Some("128k"));
        assert_eq!(get_flag_value(cmd, "-nonexistent"), None);
    }

    #[test]
    #[should_panic(expected = "Expected command to contain")]
    fn test_assert_cmd_contains_fails() {
        assert_cmd_contains("ffmpeg -i input.mp4", "-nonexistent");
    }
}
