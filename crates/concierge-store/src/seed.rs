//! Loading hotels and FAQs from a JSON seed file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use concierge_core::types::{FaqEntry, HotelId, HotelProfile};

use crate::SqliteStore;

#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub hotels: Vec<SeedHotel>,
}

#[derive(Debug, Deserialize)]
pub struct SeedHotel {
    #[serde(flatten)]
    pub profile: HotelProfile,
    #[serde(default)]
    pub faqs: Vec<FaqEntry>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub hotels_created: usize,
    pub hotels_skipped: usize,
    pub faqs_created: usize,
}

impl SeedFile {
    pub fn from_json(text: &str) -> Result<Self> { serde_json::from_str(text).context("invalid seed file") }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&text)
    }

    /// Inserts every hotel whose slug is not yet present, with its FAQs.
    pub async fn apply(&self, store: &SqliteStore) -> Result<SeedReport> {
        let mut report = SeedReport::default();
        for hotel in &self.hotels {
            if let Some(existing) = store.hotel_id_by_slug(&hotel.profile.slug).await? {
                tracing::info!(slug = %hotel.profile.slug, hotel_id = existing, "hotel already seeded");
                report.hotels_skipped += 1;
                continue;
            }
            let hotel_id: HotelId = store.insert_hotel(&hotel.profile).await?;
            for (position, faq) in hotel.faqs.iter().enumerate() {
                let mut faq = faq.clone();
                faq.hotel_id = hotel_id;
                if faq.order_index == 0 {
                    faq.order_index = i32::try_from(position).unwrap_or(i32::MAX);
                }
                store.insert_faq(&faq).await?;
                report.faqs_created += 1;
            }
            tracing::info!(slug = %hotel.profile.slug, hotel_id, faqs = hotel.faqs.len(), "seeded hotel");
            report.hotels_created += 1;
        }
        Ok(report)
    }
}
