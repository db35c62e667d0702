use crate::error::{Result, TrialLoggerError};
use csv::{ReaderBuilder, StringRecord, Trim};
use fitts_core::{POSE_HEADER, PoseSample, Quat, Vec3};
use nalgebra::Quaternion;
use std::{fs::File, io::Read, path::Path};

pub fn read_pose_csv<P: AsRef<Path>>(path: P) -> Result<Vec<PoseSample>> {
    let file = File::open(path.as_ref())?;
    read_poses_from_reader(file)
}

/// Reads `timestamp,x,y,z,qx,qy,qz,qw,trigger` rows. Blank rows are skipped;
/// the trigger column accepts `1/0` and `true/false`.
pub fn read_poses_from_reader<R: Read>(reader: R) -> Result<Vec<PoseSample>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);

    validate_headers(&mut rdr)?;

    let mut poses = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let rec = result?;
        let row = i + 2; // 1-indexed, after the header
        if rec.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        poses.push(parse_record(&rec, row)?);
    }
    Ok(poses)
}

fn validate_headers<R: Read>(rdr: &mut csv::Reader<R>) -> Result<()> {
    let headers = rdr
        .headers()
        .map_err(|e| TrialLoggerError::PoseHeader(format!("Failed to read headers: {}", e)))?;

    for (i, expected) in POSE_HEADER.iter().enumerate() {
        let found = headers.get(i).unwrap_or("");
        if !found.eq_ignore_ascii_case(expected) {
            return Err(TrialLoggerError::PoseHeader(format!(
                "Expected '{}' in column {}, found '{}'",
                expected, i, found
            )));
        }
    }
    Ok(())
}

fn parse_record(rec: &StringRecord, row: usize) -> Result<PoseSample> {
    if rec.len() < POSE_HEADER.len() {
        return Err(TrialLoggerError::PoseRow {
            row,
            expected: POSE_HEADER.len(),
            got: rec.len(),
        });
    }
    let num = |i: usize| -> Result<f64> {
        let value = rec.get(i).unwrap_or("");
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| TrialLoggerError::PoseValue {
                row,
                column: POSE_HEADER[i],
                value: value.to_string(),
            })
    };

    let (qx, qy, qz, qw) = (num(4)?, num(5)?, num(6)?, num(7)?);
    let rotation = Quat::try_new(Quaternion::new(qw, qx, qy, qz), f64::EPSILON).ok_or_else(|| {
        TrialLoggerError::PoseValue {
            row,
            column: "qw",
            value: format!("({qx}, {qy}, {qz}, {qw})"),
        }
    })?;

    Ok(PoseSample {
        timestamp: num(0)?,
        position: Vec3::new(num(1)?, num(2)?, num(3)?),
        rotation,
        trigger_pressed: parse_trigger(rec.get(8).unwrap_or(""), row)?,
    })
}

fn parse_trigger(value: &str, row: usize) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" | "" => Ok(false),
        _ => Err(TrialLoggerError::PoseValue {
            row,
            column: "trigger",
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "timestamp,x,y,z,qx,qy,qz,qw,trigger";

    #[test]
    fn test_reads_rows() {
        let data = format!("{HEADER}\n0.0,0.1,1.0,0.4,0,0,0,1,0\n0.011,0.12,1.0,0.4,0,0,0,1,true\n");
        let poses = read_poses_from_reader(data.as_bytes()).unwrap();
        assert_eq!(poses.len(), 2);
        assert_eq!(poses[0].position, Vec3::new(0.1, 1.0, 0.4));
        assert!(!poses[0].trigger_pressed);
        assert!(poses[1].trigger_pressed);
        assert_eq!(poses[1].timestamp, 0.011);
        assert_eq!(poses[1].rotation, Quat::identity());
    }

    #[test]
    fn test_header_case_insensitive_and_blank_rows() {
        let data = "Timestamp,X,Y,Z,QX,QY,QZ,QW,Trigger\n\n1,0,0,0,0,0,0,1,1\n";
        let poses = read_poses_from_reader(data.as_bytes()).unwrap();
        assert_eq!(poses.len(), 1);
    }

    #[test]
    fn test_wrong_header() {
        let data = "time,x,y,z,qx,qy,qz,qw,trigger\n";
        let err = read_poses_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, TrialLoggerError::PoseHeader(_)));
    }

    #[test]
    fn test_short_row() {
        let data = format!("{HEADER}\n0.0,0.1,1.0\n");
        let err = read_poses_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, TrialLoggerError::PoseRow { row: 2, got: 3, .. }));
    }

    #[test]
    fn test_bad_number() {
        let data = format!("{HEADER}\n0.0,abc,1.0,0.4,0,0,0,1,0\n");
        let err = read_poses_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            TrialLoggerError::PoseValue { column: "x", .. }
        ));
    }

    #[test]
    fn test_rotation_is_normalized() {
        let data = format!("{HEADER}\n0.0,0,0,0,0,0,0,2,0\n");
        let poses = read_poses_from_reader(data.as_bytes()).unwrap();
        assert_eq!(poses[0].rotation, Quat::identity());
    }

    #[test]
    fn test_zero_rotation_rejected() {
        let data = format!("{HEADER}\n0.0,0,0,0,0,0,0,0,0\n");
        let err = read_poses_from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, TrialLoggerError::PoseValue { row: 2, column: "qw", .. }));
    }

    #[test]
    fn test_bad_trigger() {
        let data = format!("{HEADER}\n0.0,0,0,0,0,0,0,1,maybe\n");
        assert!(read_poses_from_reader(data.as_bytes()).is_err());
    }

    #[test]
    fn test_read_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "0.5,1,2,3,0,0,0,1,0").unwrap();
        let poses = read_pose_csv(file.path()).unwrap();
        assert_eq!(poses[0].position, Vec3::new(1.0, 2.0, 3.0));
    }
}
