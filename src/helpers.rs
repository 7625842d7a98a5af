use std::{fs, path::Path, process::Command};

use anyhow::{bail, Result};
use rayon::iter::{ParallelBridge, ParallelIterator};
use time::{
    format_description::{well_known::Rfc3339, BorrowedFormatItem},
    macros::format_description,
    Date, OffsetDateTime, PrimitiveDateTime,
};

const LOCAL_DATETIME: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]");
const DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const DISPLAY_DATE: &[BorrowedFormatItem<'static>] =
    format_description!("[day padding:none] [month repr:short] [year]");

/// Run a command and return its trimmed stdout.
pub fn run_command(program: &str, args: &[&str]) -> Result<String> {
    let out = Command::new(program).args(args).output()?;
    if !out.status.success() {
        bail!("`{program}` exited with {}", out.status);
    }
    Ok(String::from_utf8(out.stdout)?.trim().to_owned())
}

/// Copy directory recursively.
/// Note: the empty directory is ignored.
pub fn copy_dir(source: &Path, dest: &Path) -> Result<()> {
    let source_parent = source.parent().unwrap_or(source);
    walkdir::WalkDir::new(source)
        .into_iter()
        .par_bridge()
        .try_for_each(|entry| {
            let entry = entry?;
            let path = entry.path();
            // Directories may be visited after their files on rayon threads,
            // so parents are created on demand from the file side.
            if path.is_file() {
                if let Some(parent) = path.parent() {
                    let dest_parent = dest.join(parent.strip_prefix(source_parent)?);
                    if !dest_parent.exists() {
                        fs::create_dir_all(dest_parent)?;
                    }
                }
                let to = dest.join(path.strip_prefix(source_parent)?);
                fs::copy(path, to)?;
            }

            anyhow::Ok(())
        })?;
    Ok(())
}

/// Parse a publish timestamp.
///
/// Accepts RFC 3339, a local date-time without offset (taken as UTC),
/// or a bare date (midnight UTC).
pub fn parse_datetime(text: &str) -> Option<OffsetDateTime> {
    let text = text.trim();
    if let Ok(datetime) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(datetime);
    }

    if let Ok(datetime) = PrimitiveDateTime::parse(text, LOCAL_DATETIME) {
        return Some(datetime.assume_utc());
    }

    Date::parse(text, DATE)
        .ok()
        .map(|date| date.midnight().assume_utc())
}

/// Human readable date, such as `1 Jun 2023`.
pub fn format_display_date(datetime: &OffsetDateTime) -> String {
    datetime.format(DISPLAY_DATE).unwrap_or_default()
}

/// A serde module to serialize and deserialize [`time::OffsetDateTime`] type.
///
/// Serializes to RFC 3339. Deserializes from any form [`parse_datetime`] accepts,
/// given either as a string or as a native TOML datetime.
pub mod serde_datetime {
    use serde::{de, ser, Serializer};
    use time::{format_description::well_known::Rfc3339, OffsetDateTime};

    pub fn serialize<S: Serializer>(
        datetime: &OffsetDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let text = datetime.format(&Rfc3339).map_err(ser::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D>(d: D) -> Result<OffsetDateTime, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        d.deserialize_any(DatetimeVisitor)
    }

    struct DatetimeVisitor;

    impl<'de> de::Visitor<'de> for DatetimeVisitor {
        type Value = OffsetDateTime;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a datetime like 2023-01-01T00:00:00Z or a date like 2023-01-01")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            super::parse_datetime(v)
                .ok_or_else(|| E::custom(format!("the datetime value `{v}` is invalid")))
        }

        // TOML datetimes are handed over as a single entry map.
        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: de::MapAccess<'de>,
        {
            let (_, value) = map
                .next_entry::<String, String>()?
                .ok_or_else(|| de::Error::custom("empty datetime value"))?;
            self.visit_str(&value)
        }
    }
}
