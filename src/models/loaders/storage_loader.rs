use crate::error::{AppError, AppResult};
use std::path::Path;

/// 读取运动数据文件（.mot / .sto）的首末时间
///
/// 文件格式：头部以 `endheader` 结束，随后一行是列名，
/// 之后每行第一列为时间
pub fn read_time_range(path: &Path) -> AppResult<(f64, f64)> {
    let content =
        std::fs::read_to_string(path).map_err(|e| AppError::file_read_failed(path, e))?;
    parse_time_range(&content, &path.display().to_string())
}

pub fn parse_time_range(content: &str, source: &str) -> AppResult<(f64, f64)> {
    let mut lines = content.lines();

    if !lines.by_ref().any(|line| line.trim().eq_ignore_ascii_case("endheader")) {
        return Err(AppError::storage(source, "找不到 endheader"));
    }

    // 列名行
    let labels = lines
        .by_ref()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| AppError::storage(source, "缺少列名行"))?;
    if !labels.split_whitespace().next().is_some_and(|l| l.eq_ignore_ascii_case("time")) {
        tracing::debug!("{} 的第一列不是 time: {}", source, labels.trim());
    }

    let mut first: Option<f64> = None;
    let mut last: Option<f64> = None;
    for (row, line) in lines.enumerate() {
        let Some(cell) = line.split_whitespace().next() else {
            continue;
        };
        let time: f64 = cell
            .parse()
            .map_err(|_| AppError::storage(source, format!("第 {} 行时间无法解析: '{}'", row + 1, cell)))?;
        first.get_or_insert(time);
        last = Some(time);
    }

    match (first, last) {
        (Some(first), Some(last)) => Ok((first, last)),
        _ => Err(AppError::storage(source, "没有任何数据行")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;

    const MOT: &str = "wu_walk01\nversion=1\nnRows=3\nnColumns=3\ninDegrees=yes\nendheader\n\
time\tpelvis_tilt\thip_flexion_r\n\
0.50\t1.0\t2.0\n\
0.51\t1.1\t2.1\n\
1.75\t1.2\t2.2\n";

    #[test]
    fn test_reads_first_and_last_time() {
        assert_eq!(parse_time_range(MOT, "wu_walk01.mot").unwrap(), (0.5, 1.75));
    }

    #[test]
    fn test_trailing_blank_lines_are_ignored() {
        let content = format!("{}\n\n", MOT);
        assert_eq!(parse_time_range(&content, "trial").unwrap(), (0.5, 1.75));
    }

    #[test]
    fn test_missing_header_end() {
        let err = parse_time_range("time a\n0 1\n", "bad.mot").unwrap_err();
        assert!(matches!(err, AppError::Parse(ParseError::Storage { .. })));
    }

    #[test]
    fn test_no_rows() {
        let err = parse_time_range("endheader\ntime a\n", "empty.mot").unwrap_err();
        assert!(matches!(err, AppError::Parse(ParseError::Storage { .. })));
    }

    #[test]
    fn test_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trial.sto");
        std::fs::write(&path, MOT).unwrap();
        assert_eq!(read_time_range(&path).unwrap(), (0.5, 1.75));
    }
}
