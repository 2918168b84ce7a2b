use anyhow::{
  Context,
  anyhow
};
use chrono::{
  Duration,
  Local,
  NaiveDate
};

pub const DEADLINE_FORMAT: &str =
  "%Y-%m-%d";

pub fn today() -> NaiveDate {
  Local::now().date_naive()
}

/// Parses a deadline as typed on the
/// command line.
///
/// Accepts `YYYY-MM-DD`, `today`,
/// `tomorrow` and `+Nd` relative to
/// `today`.
pub fn parse_deadline(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "today" => return Ok(today),
    | "tomorrow" => {
      return Ok(
        today + Duration::days(1)
      );
    }
    | _ => {}
  }

  if let Some(days) = lower
    .strip_prefix('+')
    .and_then(|rest| {
      rest.strip_suffix('d')
    })
  {
    let days: i64 =
      days.parse().with_context(|| {
        format!(
          "invalid relative deadline: \
           {token}"
        )
      })?;
    return Duration::try_days(days)
      .and_then(|delta| {
        today.checked_add_signed(delta)
      })
      .ok_or_else(|| {
        anyhow!(
          "deadline out of range: \
           {token}"
        )
      });
  }

  NaiveDate::parse_from_str(
    token,
    DEADLINE_FORMAT
  )
  .with_context(|| {
    format!(
      "invalid deadline: {token} \
       (expected YYYY-MM-DD, today, \
       tomorrow or +Nd)"
    )
  })
}

/// Serde adapter for the optional
/// deadline: `"YYYY-MM-DD"` or `null`.
/// An empty string reads as absent.
pub mod deadline_serde {
  use chrono::NaiveDate;
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  use super::DEADLINE_FORMAT;

  pub fn serialize<S>(
    date: &Option<NaiveDate>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match date {
      | Some(value) => {
        serializer.serialize_str(
          &value
            .format(DEADLINE_FORMAT)
            .to_string()
        )
      }
      | None => {
        serializer.serialize_none()
      }
    }
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<Option<NaiveDate>, D::Error>
  where
    D: Deserializer<'de>
  {
    let opt =
      Option::<String>::deserialize(
        deserializer
      )?;
    match opt.as_deref().map(str::trim) {
      | None | Some("") => Ok(None),
      | Some(raw) => {
        NaiveDate::parse_from_str(
          raw,
          DEADLINE_FORMAT
        )
        .map(Some)
        .map_err(
          serde::de::Error::custom
        )
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn day(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn parses_iso_date() {
    let parsed = parse_deadline(
      "2024-01-01",
      day(2023, 6, 1)
    )
    .expect("parse");
    assert_eq!(parsed, day(2024, 1, 1));
  }

  #[test]
  fn parses_relative_words() {
    let base = day(2024, 2, 28);
    assert_eq!(
      parse_deadline("Today", base)
        .expect("today"),
      base
    );
    assert_eq!(
      parse_deadline("tomorrow", base)
        .expect("tomorrow"),
      day(2024, 2, 29)
    );
    assert_eq!(
      parse_deadline("+3d", base)
        .expect("+3d"),
      day(2024, 3, 2)
    );
  }

  #[test]
  fn rejects_garbage() {
    let base = day(2024, 1, 1);
    assert!(
      parse_deadline("soon", base)
        .is_err()
    );
    assert!(
      parse_deadline("+xd", base)
        .is_err()
    );
    assert!(
      parse_deadline(
        "2024-13-01",
        base
      )
      .is_err()
    );
  }

  #[test]
  fn huge_relative_offset_is_an_error() {
    let base = day(2024, 1, 1);
    assert!(
      parse_deadline(
        "+100000000000000d",
        base
      )
      .is_err()
    );
    assert!(
      parse_deadline(
        "+1000000000d",
        base
      )
      .is_err()
    );
  }
}
