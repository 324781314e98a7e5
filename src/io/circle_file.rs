//! Circle list text files.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::schema::Circle;

use super::IoError;

/// Parse circle list text. Blank lines are skipped; `path` is only used in
/// error messages.
pub fn parse_circles(text: &str, path: &Path) -> Result<Vec<Circle>, IoError> {
    let mut circles = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let parse_error = |message: String| IoError::Parse {
            path: path.to_path_buf(),
            line: i + 1,
            message,
        };

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 3 {
            return Err(parse_error(format!(
                "expected 3 fields (x,y,radius), found {}",
                fields.len()
            )));
        }
        let mut values = [0.0f32; 3];
        for (value, field) in values.iter_mut().zip(&fields) {
            *value = field
                .parse()
                .map_err(|e| parse_error(format!("invalid number {:?}: {}", field, e)))?;
        }
        circles.push(Circle::new(values[0], values[1], values[2]));
    }
    Ok(circles)
}

/// Format circles as `x,y,radius` lines. Tags are not written.
pub fn format_circles(circles: &[Circle]) -> String {
    let mut out = String::with_capacity(circles.len() * 32);
    for c in circles {
        let _ = writeln!(out, "{},{},{}", c.x, c.y, c.radius);
    }
    out
}

/// Read a circle list file.
pub fn read_circles(path: &Path) -> Result<Vec<Circle>, IoError> {
    let text = fs::read_to_string(path)?;
    parse_circles(&text, path)
}

/// Write a circle list file.
pub fn write_circles(path: &Path, circles: &[Circle]) -> Result<(), IoError> {
    fs::write(path, format_circles(circles))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_blank_lines() {
        let circles = parse_circles("0.5,0.25,0.1\n\n 0.1 , 0.2 , 0.05 \n", Path::new("a.csv")).unwrap();
        assert_eq!(circles, vec![Circle::new(0.5, 0.25, 0.1), Circle::new(0.1, 0.2, 0.05)]);
    }

    #[test]
    fn test_parse_error_has_line_number() {
        let err = parse_circles("0.5,0.5,0.1\n0.5,oops,0.1\n", Path::new("b.csv")).unwrap_err();
        match err {
            IoError::Parse { line, path, .. } => {
                assert_eq!(line, 2);
                assert_eq!(path, Path::new("b.csv"));
            }
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_wrong_field_count() {
        assert!(matches!(
            parse_circles("0.5,0.5\n", Path::new("c.csv")),
            Err(IoError::Parse { line: 1, .. })
        ));
        assert!(parse_circles("0.5,0.5,0.1,1\n", Path::new("c.csv")).is_err());
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("circles.csv");
        let circles = vec![
            Circle::new(0.123_456_79, 0.5, 0.01).with_tag(3),
            Circle::new(0.9, 0.1, 0.1),
        ];
        write_circles(&path, &circles).unwrap();

        let loaded = read_circles(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].x, circles[0].x);
        assert_eq!(loaded[0].tag, 0);
        assert_eq!(loaded[1], circles[1]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_circles(&dir.path().join("missing.csv")),
            Err(IoError::Io(_))
        ));
    }
}
