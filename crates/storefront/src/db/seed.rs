//! First-run catalog seed.
//!
//! A fresh install shows a small hand-picked catalog and a few news items
//! until the remote sync replaces or extends them.

use rust_decimal::Decimal;
use tracing::info;

use gameverse_core::{NewsId, Price, ProductId};

use super::RepositoryError;
use super::store::Store;
use crate::models::{NewsItem, Product};

/// Rows written by [`seed_if_empty`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub products: usize,
    pub news: usize,
}

/// The built-in starter catalog.
#[must_use]
pub fn starter_products() -> Vec<Product> {
    [
        (
            1,
            "Elite wireless controller",
            "High-performance controller for competitive gaming.",
            99_000,
            "https://i.postimg.cc/9frjQb6Y/OIP-1.webp",
        ),
        (
            2,
            "7.1 gaming headset",
            "Surround sound for total immersion.",
            79_000,
            "https://i.postimg.cc/6QyNpckr/81Sn-Vtk-Isy-L-AC-SL1500.jpg",
        ),
        (
            3,
            "GK100 mechanical keyboard",
            "Tactile response and customizable backlighting.",
            120_000,
            "https://i.postimg.cc/yNkz8jMT/Teclado-Mecanico-Hp-Gaming-Gk100.png",
        ),
        (
            4,
            "G502 programmable gaming mouse",
            "High-precision sensor and configurable buttons.",
            45_000,
            "https://i.postimg.cc/6QyNpckC/g502-heroe.jpg",
        ),
        (
            5,
            "Ergonomic gaming chair",
            "Lumbar support and racing design.",
            189_000,
            "https://i.postimg.cc/7LfyZ9FV/Silla-Gamer-Copia-Copia-Copia-Copia-Copia-Copia-Homen-133541884.webp",
        ),
        (
            7,
            "Webcam Pro 4K",
            "Video calls and streaming in ultra high definition.",
            130_000,
            "https://i.postimg.cc/bvsjwg7b/413Nn-Hz-V0CL.jpg",
        ),
    ]
    .into_iter()
    .map(|(id, name, description, price, image_url)| Product {
        id: ProductId::new(id),
        name: name.to_owned(),
        description: description.to_owned(),
        price: Price::new(Decimal::from(price)).unwrap_or(Price::ZERO),
        image_url: image_url.to_owned(),
    })
    .collect()
}

/// The built-in news items.
#[must_use]
pub fn starter_news() -> Vec<NewsItem> {
    [
        (
            1,
            "Elden Ring: Shadow of the Erdtree",
            "The long-awaited Elden Ring expansion gets its first images while players count down to the release date...",
            "https://i.postimg.cc/d0LKV6b8/1719357444-elden-ring-shadow-of-the-erdtree-dlc-xbox-series-xs-0.webp",
        ),
        (
            2,
            "Star Wars Outlaws revealed",
            "Ubisoft surprises everyone with a new open-world Star Wars game. What does this entry have in store?...",
            "https://i.postimg.cc/BvXGnprc/1724372809-star-wars-outlaws-xbox-series-xs-pre-orden-0.webp",
        ),
        (
            3,
            "Nintendo Direct recap",
            "A new 2D Zelda was announced along with the return of a cult classic. Stay tuned for more news!...",
            "https://i.postimg.cc/Dz8Kw69b/500-333.jpg",
        ),
    ]
    .into_iter()
    .map(|(id, title, summary, image_url)| NewsItem {
        id: NewsId::new(id),
        title: title.to_owned(),
        summary: summary.to_owned(),
        image_url: image_url.to_owned(),
    })
    .collect()
}

/// Write the starter rows into tables that are still empty.
///
/// Each table is checked on its own, so a store that already has products
/// but no news only receives the news.
///
/// # Errors
///
/// Returns `RepositoryError` if counting or inserting fails.
pub async fn seed_if_empty(store: &dyn Store) -> Result<SeedReport, RepositoryError> {
    let mut report = SeedReport::default();

    if store.count_products().await? == 0 {
        let products = starter_products();
        store.upsert_products(&products).await?;
        report.products = products.len();
    }

    if store.count_news().await? == 0 {
        let news = starter_news();
        store.upsert_news(&news).await?;
        report.news = news.len();
    }

    if report != SeedReport::default() {
        info!(
            products = report.products,
            news = report.news,
            "Seeded starter catalog"
        );
    }

    Ok(report)
}
