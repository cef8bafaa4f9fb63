use chrono::{DateTime, Utc};

use crate::error::MalformedDateError;
use crate::models::{Post, RawItem};

/// Converts a raw feed item into a [`Post`].
///
/// The publication date must be an RFC 2822 date such as
/// `Mon, 2 Jan 2006 15:04:05 MST`. Text fields are copied as-is.
pub fn normalize(item: &RawItem) -> Result<Post, MalformedDateError> {
    let published_at = parse_pub_date(&item.pub_date)?;

    Ok(Post {
        id: None,
        title: item.title.clone(),
        content: item.description.clone(),
        published_at,
        link: item.link.clone(),
    })
}

pub fn parse_pub_date(value: &str) -> Result<DateTime<Utc>, MalformedDateError> {
    DateTime::parse_from_rfc2822(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| MalformedDateError {
            value: value.to_owned(),
        })
}
