//! # Development Seed Data
//!
//! Wipes every listing (through the same cascade delete the app uses, so
//! no orphaned reviews are left behind) and fills the database with random
//! campgrounds owned by one existing user.

use crate::blob;
use crate::db::models::{ImageRef, ListingFields};
use crate::db::{listings, users};
use crate::error::AppResult;
use crate::state::AppState;
use rand::Rng;

pub const DEFAULT_COUNT: usize = 50;

const DESCRIPTORS: &[&str] = &[
    "Forest", "Ancient", "Petrified", "Roaring", "Cascade", "Tumbling", "Silent", "Redwood",
    "Bullfrog", "Maple", "Misty", "Elk", "Grizzly", "Ocean", "Sea", "Sky", "Dusty", "Diamond",
];

const PLACES: &[&str] = &[
    "Flats", "Village", "Canyon", "Pond", "Group Camp", "Horse Camp", "Ghost Town", "Camp",
    "Dispersed Camp", "Backcountry", "River", "Creek", "Creekside", "Bay", "Spring", "Bayshore",
    "Sands", "Mule Camp", "Hunting Camp", "Cliffs", "Hollow",
];

/// (city, state, longitude, latitude)
const CITIES: &[(&str, &str, f64, f64)] = &[
    ("Denver", "Colorado", -104.9903, 39.7392),
    ("Boulder", "Colorado", -105.2705, 40.0150),
    ("Flagstaff", "Arizona", -111.6513, 35.1983),
    ("Bend", "Oregon", -121.3153, 44.0582),
    ("Bozeman", "Montana", -111.0429, 45.6770),
    ("Moab", "Utah", -109.5498, 38.5733),
    ("Asheville", "North Carolina", -82.5515, 35.5951),
    ("Burlington", "Vermont", -73.2121, 44.4759),
    ("Duluth", "Minnesota", -92.1005, 46.7867),
    ("Santa Fe", "New Mexico", -105.9378, 35.6870),
    ("Missoula", "Montana", -113.9940, 46.8721),
    ("Jackson", "Wyoming", -110.7624, 43.4799),
];

const DESCRIPTION: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Sed do eiusmod \
    tempor incididunt ut labore et dolore magna aliqua. Ut enim ad minim veniam, quis nostrud \
    exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat.";

/// Image every seeded listing points at; not backed by the blob store.
pub fn placeholder_image() -> ImageRef {
    ImageRef {
        url: "https://source.unsplash.com/collection/483251".to_string(),
        key: "seed-placeholder".to_string(),
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub deleted_listings: usize,
    pub deleted_reviews: u64,
    pub created_listings: usize,
}

fn pick<'a, R: Rng>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items[rng.gen_range(0..items.len())]
}

/// Random campground: "descriptor place" title, a known city, $10 to $29.
pub fn random_listing<R: Rng>(rng: &mut R) -> ListingFields {
    let (city, state, longitude, latitude) = CITIES[rng.gen_range(0..CITIES.len())];

    ListingFields {
        title: format!("{} {}", pick(rng, DESCRIPTORS), pick(rng, PLACES)),
        description: DESCRIPTION.to_string(),
        price: f64::from(rng.gen_range(10u32..30)),
        location: format!("{city}, {state}"),
        longitude,
        latitude,
    }
}

/// Replace all listings with `count` random ones authored by `author_username`.
pub async fn reseed<R: Rng>(
    state: &AppState,
    author_username: &str,
    count: usize,
    rng: &mut R,
) -> AppResult<SeedReport> {
    let author = users::find_by_username(&state.db, author_username).await?;
    let mut report = SeedReport::default();

    for existing in listings::list_listings(&state.db).await? {
        let deleted = listings::delete_listing_and_reviews(&state.db, &existing.id).await?;
        match deleted.cascade {
            Ok(n) => report.deleted_reviews += n,
            Err(e) => tracing::error!(listing_id = %existing.id, error = ?e, "Review cleanup failed"),
        }
        let placeholder = placeholder_image().key;
        let keys = deleted
            .listing
            .images
            .into_iter()
            .map(|i| i.key)
            .filter(|key| *key != placeholder)
            .collect();
        blob::discard(state.blobs.as_ref(), keys).await;
        report.deleted_listings += 1;
    }

    let images = [placeholder_image()];
    for _ in 0..count {
        let fields = random_listing(rng);
        listings::create_listing(&state.db, &fields, &author.id, &images).await?;
        report.created_listings += 1;
    }

    tracing::info!(?report, author = %author.username, "Seeded database");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::ReviewFields;
    use crate::db::reviews;
    use crate::test_support::{listing_fields, memory_pool, MemoryBlobStore};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    #[test]
    fn random_listings_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let fields = random_listing(&mut rng);
            assert!((10.0..30.0).contains(&fields.price));
            assert_eq!(fields.price.fract(), 0.0);
            assert!(fields.title.contains(' '));
            assert!(CITIES.iter().any(|(_, _, lng, lat)| *lng == fields.longitude && *lat == fields.latitude));
        }
    }

    #[tokio::test]
    async fn reseed_replaces_listings_and_their_reviews() {
        let state = AppState::from_parts(memory_pool().await, Arc::new(MemoryBlobStore::default()));
        let author = users::create_user(&state.db, "seeder", "s@example.com", "h").await.unwrap();
        let old = listings::create_listing(&state.db, &listing_fields("Old Camp", 5.0), &author.id, &[])
            .await
            .unwrap();
        let review = ReviewFields {
            body: "Fine".into(),
            rating: 3,
        };
        reviews::create_review(&state.db, &old.id, &review, &author.id).await.unwrap();

        let mut rng = StdRng::seed_from_u64(1);
        let report = reseed(&state, "seeder", 5, &mut rng).await.unwrap();

        assert_eq!(
            report,
            SeedReport {
                deleted_listings: 1,
                deleted_reviews: 1,
                created_listings: 5,
            }
        );
        let all = listings::list_listings(&state.db).await.unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.iter().all(|l| l.author_id == author.id && l.images == vec![placeholder_image()]));
        assert_eq!(reviews::count_for_listing(&state.db, &old.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reseed_requires_an_existing_author() {
        let state = AppState::from_parts(memory_pool().await, Arc::new(MemoryBlobStore::default()));
        let mut rng = StdRng::seed_from_u64(1);

        let result = reseed(&state, "nobody", 3, &mut rng).await;

        assert!(matches!(result, Err(crate::error::AppError::NotFound(_))));
    }
}
