//! Human-readable deprecation warnings for server types and images.
//!
//! The message wording is matched by downstream tooling and must stay stable, including
//! its irregular phrasing.

use chrono::{DateTime, Months, Utc};
use hcloud_core::types::DeprecationInfo;

use crate::image::Image;
use crate::server_type::{ServerType, ServerTypeLocation};

/// Months between an image deprecation announcement and its end-of-order date.
pub const IMAGE_UNAVAILABLE_AFTER_MONTHS: u32 = 3;

/// Outcome of a deprecation analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeprecationWarning {
    /// Warning text; empty when there is nothing to report.
    pub message: String,
    /// The resource can no longer be ordered.
    pub unavailable: bool,
}

impl DeprecationWarning {
    fn new(message: String, unavailable: bool) -> Self {
        Self {
            message,
            unavailable,
        }
    }

    /// Returns true if there is nothing to report.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.message.is_empty()
    }
}

/// Analyze a server type's deprecation, optionally for one location only.
///
/// An empty `location` is treated like no filter.
#[must_use]
pub fn analyze_server_type(server_type: &ServerType, location: Option<&str>) -> DeprecationWarning {
    analyze_server_type_at(server_type, location, Utc::now())
}

/// [`analyze_server_type`] evaluated at `now`.
#[must_use]
pub fn analyze_server_type_at(
    server_type: &ServerType,
    location: Option<&str>,
    now: DateTime<Utc>,
) -> DeprecationWarning {
    let name = format!("Server Type \"{}\"", server_type.name);

    if let Some(deprecation) = server_type
        .deprecation
        .filter(|d| d.is_deprecated_at(now))
    {
        return if deprecation.unavailable_after <= now {
            DeprecationWarning::new(
                format!("{name} is unavailable in all locations and can no longer be ordered"),
                true,
            )
        } else {
            DeprecationWarning::new(
                format!(
                    "{name} is deprecated in all locations and will no longer be available for order as of {}",
                    render_date(deprecation.unavailable_after)
                ),
                false,
            )
        };
    }

    let deprecated: Vec<(&ServerTypeLocation, DeprecationInfo)> = server_type
        .locations
        .iter()
        .filter_map(|loc| {
            loc.deprecation
                .filter(|d| d.is_deprecated_at(now))
                .map(|d| (loc, d))
        })
        .collect();
    if deprecated.is_empty() {
        return DeprecationWarning::default();
    }

    if let Some(filter) = location.filter(|l| !l.is_empty()) {
        return match deprecated.iter().find(|(loc, _)| loc.name == filter) {
            Some((_, d)) if d.is_unavailable_at(now) => DeprecationWarning::new(
                format!("{name} is unavailable in {filter} and can no longer be ordered"),
                true,
            ),
            Some((_, d)) => DeprecationWarning::new(
                format!(
                    "{name} is deprecated in {filter} and will no longer be available for order as of {}",
                    render_date(d.unavailable_after)
                ),
                false,
            ),
            None => DeprecationWarning::default(),
        };
    }

    if deprecated.len() < server_type.locations.len() {
        return DeprecationWarning::default();
    }

    let unavailable: Vec<&ServerTypeLocation> = deprecated
        .iter()
        .filter(|(_, d)| d.is_unavailable_at(now))
        .map(|(loc, _)| *loc)
        .collect();
    let deprecated_csv = join_names(deprecated.iter().map(|(loc, _)| *loc));

    if unavailable.len() == deprecated.len() {
        DeprecationWarning::new(
            format!(
                "{name} is unavailable in all locations ({deprecated_csv}) and can no longer be ordered"
            ),
            true,
        )
    } else if unavailable.is_empty() {
        DeprecationWarning::new(
            format!(
                "{name} is deprecated in all locations ({deprecated_csv}) and will no longer be available for order"
            ),
            false,
        )
    } else {
        DeprecationWarning::new(
            format!(
                "{name} is deprecated in all locations ({deprecated_csv}) and can no longer be ordered some locations ({})",
                join_names(unavailable.into_iter())
            ),
            false,
        )
    }
}

/// Analyze an image's deprecation.
#[must_use]
pub fn analyze_image(image: &Image) -> DeprecationWarning {
    analyze_image_at(image, Utc::now())
}

/// [`analyze_image`] evaluated at `now`.
#[must_use]
pub fn analyze_image_at(image: &Image, now: DateTime<Utc>) -> DeprecationWarning {
    let Some(deprecation) = image_deprecation(image).filter(|d| d.is_deprecated_at(now)) else {
        return DeprecationWarning::default();
    };

    let name = format!("Image \"{}\"", image.display_name());
    if deprecation.is_unavailable_at(now) {
        DeprecationWarning::new(
            format!("{name} is unavailable and can no longer be ordered"),
            true,
        )
    } else {
        DeprecationWarning::new(
            format!(
                "{name} is deprecated and will no longer be available for order as of {}",
                render_date(deprecation.unavailable_after)
            ),
            false,
        )
    }
}

/// Deprecation record of an image, deriving its end-of-order date from the announcement.
#[must_use]
pub fn image_deprecation(image: &Image) -> Option<DeprecationInfo> {
    let announced = image.deprecated?;
    let unavailable_after = announced
        .checked_add_months(Months::new(IMAGE_UNAVAILABLE_AFTER_MONTHS))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    Some(DeprecationInfo {
        announced,
        unavailable_after,
    })
}

fn render_date(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d").to_string()
}

fn join_names<'a>(locations: impl Iterator<Item = &'a ServerTypeLocation>) -> String {
    locations
        .map(|loc| loc.name.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
