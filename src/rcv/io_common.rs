use log::info;
use std::path::Path;

/// Number of records between two progress messages.
pub const PROGRESS_INTERVAL: usize = 50_000;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// Some user feedback on long files.
///
/// `count` is the number of records read so far for the contest, across all
/// its sources. Returns true if a message was logged.
pub fn report_progress(source_name: &str, count: usize) -> bool {
    let due = count > 0 && count % PROGRESS_INTERVAL == 0;
    if due {
        info!("{}: parsed {} cast vote records.", source_name, count);
    }
    due
}

/// True if the content of a cell is the integer 1.
pub fn is_marked(cell: &str) -> bool {
    matches!(cell.parse::<i64>(), Ok(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simplify() {
        assert_eq!(simplify_file_name("/data/2020/cvr.csv"), "cvr.csv");
        assert_eq!(simplify_file_name("cvr.csv"), "cvr.csv");
        assert_eq!(simplify_file_name(".."), "..");
    }

    #[test]
    fn progress() {
        assert!(!report_progress("cvr.csv", 0));
        assert!(!report_progress("cvr.csv", PROGRESS_INTERVAL - 1));
        assert!(report_progress("cvr.csv", PROGRESS_INTERVAL));
        assert!(report_progress("cvr.csv", 3 * PROGRESS_INTERVAL));
    }

    #[test]
    fn marks() {
        assert!(is_marked("1"));
        assert!(is_marked("01"));
        assert!(is_marked("+1"));
        for s in ["0", "", " 1", "2", "-1", "x", "1.0", "true"] {
            assert!(!is_marked(s), "{:?}", s);
        }
    }
}
