//! Translation of the listing search query string into SQL conditions.
//!
//! Only whitelisted keys are read; everything else in the query string is
//! dropped. Malformed values are rejected with a 400 before any SQL runs.

use sqlx::{Postgres, QueryBuilder};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    listings::repo_types::ListingKind,
};

pub const DEFAULT_RADIUS_METERS: f64 = 1000.0;
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Near {
    pub longitude: f64,
    pub latitude: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BountyOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    pub search: Option<String>,
    pub kind: Option<ListingKind>,
    pub tags: Vec<String>,
    pub created_before: Option<OffsetDateTime>,
    pub created_after: Option<OffsetDateTime>,
    pub bounty_below: Option<f64>,
    pub bounty_above: Option<f64>,
    pub near: Option<Near>,
    pub author: Option<Uuid>,
    pub sort: Option<BountyOrder>,
}

fn parse_instant(raw: &str, key: &str) -> AppResult<OffsetDateTime> {
    let invalid = || AppError::BadRequest(format!("Invalid date format for {key}"));
    if let Ok(millis) = raw.parse::<i64>() {
        return OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
            .map_err(|_| invalid());
    }
    OffsetDateTime::parse(raw, &Rfc3339).map_err(|_| invalid())
}

fn parse_number(raw: &str, key: &str) -> AppResult<f64> {
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(AppError::BadRequest(format!("Invalid format for {key}"))),
    }
}

fn parse_sort(raw: &str) -> AppResult<BountyOrder> {
    match raw {
        "bounty" => Ok(BountyOrder::Ascending),
        "-bounty" => Ok(BountyOrder::Descending),
        _ => Err(AppError::bad_request(
            "Invalid order. Sort by \"bounty\" or \"-bounty\"",
        )),
    }
}

/// Escapes `%`, `_` and `\` for use inside a LIKE pattern.
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl ListingFilter {
    pub fn from_query(raw: &str) -> AppResult<Self> {
        Self::from_pairs(url::form_urlencoded::parse(raw.as_bytes()).into_owned())
    }

    pub fn from_pairs<I>(pairs: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut filter = Self::default();
        let mut longitude = None;
        let mut latitude = None;
        let mut radius = None;

        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "search" => filter.search = Some(value.to_string()),
                "type" => {
                    let kind = ListingKind::parse(value).ok_or_else(|| {
                        AppError::bad_request("Invalid type. Use \"LOST\" or \"FOUND\"")
                    })?;
                    filter.kind = Some(kind);
                }
                "tags" | "tags[]" => {
                    for tag in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                        if !filter.tags.iter().any(|t| t == tag) {
                            filter.tags.push(tag.to_string());
                        }
                    }
                }
                "datelt" => filter.created_before = Some(parse_instant(value, "datelt")?),
                "dategt" => filter.created_after = Some(parse_instant(value, "dategt")?),
                "bountylt" => filter.bounty_below = Some(parse_number(value, "bountylt")?),
                "bountygt" => filter.bounty_above = Some(parse_number(value, "bountygt")?),
                "longitude" => longitude = Some(parse_number(value, "longitude")?),
                "latitude" => latitude = Some(parse_number(value, "latitude")?),
                "radius" => radius = Some(parse_number(value, "radius")?),
                "author" => {
                    let id = Uuid::parse_str(value)
                        .map_err(|_| AppError::bad_request("Invalid author ID"))?;
                    filter.author = Some(id);
                }
                "sortBy" => filter.sort = Some(parse_sort(value)?),
                _ => {}
            }
        }

        match (longitude, latitude) {
            (Some(longitude), Some(latitude)) => {
                if !(-180.0..=180.0).contains(&longitude) || !(-90.0..=90.0).contains(&latitude) {
                    return Err(AppError::bad_request(
                        "Invalid format for longitude or latitude",
                    ));
                }
                let radius = radius.unwrap_or(DEFAULT_RADIUS_METERS);
                if radius < 0.0 {
                    return Err(AppError::bad_request("Invalid format for radius"));
                }
                filter.near = Some(Near {
                    longitude,
                    latitude,
                    radius,
                });
            }
            (None, None) => {}
            _ => {
                return Err(AppError::bad_request(
                    "longitude and latitude must be given together",
                ))
            }
        }

        Ok(filter)
    }

    /// Appends ` WHERE ...`; the listing table must be aliased `l`.
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" WHERE TRUE");

        if let Some(search) = &self.search {
            let pattern = format!("%{}%", escape_like(search));
            qb.push(" AND (l.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR l.description ILIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        if let Some(kind) = self.kind {
            qb.push(" AND l.kind = ").push_bind(kind.as_str());
        }
        if !self.tags.is_empty() {
            qb.push(" AND l.tags && ").push_bind(self.tags.clone());
        }
        if let Some(before) = self.created_before {
            qb.push(" AND l.created_at < ").push_bind(before);
        }
        if let Some(after) = self.created_after {
            qb.push(" AND l.created_at > ").push_bind(after);
        }
        if let Some(below) = self.bounty_below {
            qb.push(" AND l.bounty < ").push_bind(below);
        }
        if let Some(above) = self.bounty_above {
            qb.push(" AND l.bounty > ").push_bind(above);
        }
        if let Some(near) = self.near {
            // haversine distance in meters
            qb.push(format!(" AND (2 * {EARTH_RADIUS_METERS} * asin(LEAST(1.0, sqrt("))
                .push("power(sin(radians(l.latitude - ")
                .push_bind(near.latitude)
                .push(") / 2), 2) + cos(radians(")
                .push_bind(near.latitude)
                .push(")) * cos(radians(l.latitude)) * power(sin(radians(l.longitude - ")
                .push_bind(near.longitude)
                .push(") / 2), 2))))) <= ")
                .push_bind(near.radius);
        }
        if let Some(author) = self.author {
            qb.push(" AND l.poster_id = ").push_bind(author);
        }
    }

    /// Appends ` ORDER BY ...`; creation order unless a bounty sort was asked for.
    pub fn push_order(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        match self.sort {
            Some(BountyOrder::Ascending) => qb.push(" ORDER BY l.bounty ASC, l.created_at ASC"),
            Some(BountyOrder::Descending) => qb.push(" ORDER BY l.bounty DESC, l.created_at ASC"),
            None => qb.push(" ORDER BY l.created_at ASC, l.id ASC"),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(q: &str) -> AppResult<ListingFilter> {
        ListingFilter::from_query(q)
    }

    fn sql_for(filter: &ListingFilter) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT l.id FROM listings l");
        filter.push_where(&mut qb);
        filter.push_order(&mut qb);
        qb.sql().to_string()
    }

    #[test]
    fn empty_query_matches_everything() {
        let f = parse("").unwrap();
        assert_eq!(f, ListingFilter::default());
        assert_eq!(
            sql_for(&f),
            "SELECT l.id FROM listings l WHERE TRUE ORDER BY l.created_at ASC, l.id ASC"
        );
    }

    #[test]
    fn unknown_keys_are_dropped() {
        let f = parse("poster=abc&resolved=true&limit=5&$where=1").unwrap();
        assert_eq!(f, ListingFilter::default());
    }

    #[test]
    fn bounty_bounds_are_strict() {
        let f = parse("bountygt=15").unwrap();
        assert_eq!(f.bounty_above, Some(15.0));
        let sql = sql_for(&f);
        assert!(sql.contains("l.bounty > $1"));
        assert!(!sql.contains(">="));

        let f = parse("bountylt=20&bountygt=0").unwrap();
        assert_eq!(f.bounty_below, Some(20.0));
        assert_eq!(f.bounty_above, Some(0.0));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        for q in ["bountylt=abc", "bountygt=NaN", "radius=inf&longitude=0&latitude=0", "longitude=east&latitude=1"] {
            assert!(matches!(parse(q), Err(AppError::BadRequest(_))), "{q}");
        }
    }

    #[test]
    fn dates_accept_epoch_millis_and_rfc3339() {
        let f = parse("datelt=1651363200000").unwrap();
        assert_eq!(f.created_before.unwrap().unix_timestamp(), 1_651_363_200);

        let f = parse("dategt=2021-05-01T00:00:00Z").unwrap();
        assert_eq!(f.created_after.unwrap().unix_timestamp(), 1_619_827_200);

        assert!(matches!(parse("datelt=yesterday"), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn sort_only_accepts_bounty() {
        assert_eq!(parse("sortBy=bounty").unwrap().sort, Some(BountyOrder::Ascending));
        assert_eq!(parse("sortBy=-bounty").unwrap().sort, Some(BountyOrder::Descending));
        assert!(matches!(parse("sortBy=title"), Err(AppError::BadRequest(_))));

        let sql = sql_for(&parse("sortBy=-bounty").unwrap());
        assert!(sql.ends_with("ORDER BY l.bounty DESC, l.created_at ASC"));
    }

    #[test]
    fn type_must_be_lost_or_found() {
        assert_eq!(parse("type=LOST").unwrap().kind, Some(ListingKind::Lost));
        assert_eq!(parse("type=FOUND").unwrap().kind, Some(ListingKind::Found));
        assert!(parse("type=stolen").is_err());
    }

    #[test]
    fn tags_from_repeats_and_commas() {
        let f = parse("tags=keys&tags=wallet,keys&tags[]=phone").unwrap();
        assert_eq!(f.tags, vec!["keys", "wallet", "phone"]);
        assert!(sql_for(&f).contains("l.tags && $1"));
    }

    #[test]
    fn location_defaults_radius() {
        let f = parse("longitude=0&latitude=0").unwrap();
        assert_eq!(
            f.near,
            Some(Near {
                longitude: 0.0,
                latitude: 0.0,
                radius: DEFAULT_RADIUS_METERS
            })
        );

        let f = parse("longitude=-73.98&latitude=40.75&radius=250").unwrap();
        assert_eq!(f.near.unwrap().radius, 250.0);
        let sql = sql_for(&f);
        assert!(sql.contains("asin(LEAST(1.0, sqrt("));
        assert!(sql.contains("<= $4"));
        // proximity never implies distance ordering
        assert!(sql.ends_with("ORDER BY l.created_at ASC, l.id ASC"));
    }

    #[test]
    fn location_needs_both_coordinates_in_range() {
        assert!(parse("longitude=10").is_err());
        assert!(parse("latitude=10").is_err());
        assert!(parse("longitude=181&latitude=0").is_err());
        assert!(parse("longitude=0&latitude=-91").is_err());
        assert!(parse("longitude=0&latitude=0&radius=-1").is_err());
        // radius alone is not a location filter
        assert_eq!(parse("radius=5").unwrap().near, None);
    }

    #[test]
    fn search_is_escaped_and_covers_title_or_description() {
        let f = parse("search=100%25_off").unwrap();
        assert_eq!(f.search.as_deref(), Some("100%_off"));
        assert_eq!(escape_like("100%_off"), "100\\%\\_off");
        let sql = sql_for(&f);
        assert!(sql.contains("(l.title ILIKE $1 ESCAPE '\\' OR l.description ILIKE $2 ESCAPE '\\')"));
    }

    #[test]
    fn author_must_be_an_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse(&format!("author={id}")).unwrap().author, Some(id));
        assert!(parse("author=me").is_err());
    }

    #[test]
    fn keys_combine_with_and() {
        let f = parse("type=LOST&bountygt=5&search=dog&author=00000000-0000-0000-0000-000000000001")
            .unwrap();
        let sql = sql_for(&f);
        assert!(sql.contains(" AND l.kind = $3"));
        assert!(sql.contains(" AND l.bounty > $4"));
        assert!(sql.contains(" AND l.poster_id = $5"));
    }

    #[test]
    fn blank_values_are_ignored() {
        let f = parse("search=&datelt=&type=").unwrap();
        assert_eq!(f, ListingFilter::default());
    }
}
