use serde::Serialize;

use packdeal_core::domain::pack::{NewPack, PackId};
use packdeal_core::domain::product::ProductId;

use crate::repositories::{PackRepository, RepositoryError};

const DEMO_PACKS: &[DemoPackContract] = &[
    DemoPackContract {
        name: "Summer Essentials",
        discount: 10.0,
        product_ids: &["gid://shopify/Product/1001", "gid://shopify/Product/1002"],
        description: "Two-item seasonal bundle at a modest discount",
    },
    DemoPackContract {
        name: "Starter Kit",
        discount: 25.0,
        product_ids: &[
            "gid://shopify/Product/2001",
            "gid://shopify/Product/2002",
            "gid://shopify/Product/2003",
        ],
        description: "Three-item onboarding bundle",
    },
    DemoPackContract {
        name: "Clearance Duo",
        discount: 100.0,
        product_ids: &["gid://shopify/Product/3001", "gid://shopify/Product/3002"],
        description: "Upper-bound discount giving the pair away",
    },
];

/// Deterministic demo packs for local development and smoke checks.
///
/// Seeding is idempotent by pack name: a name that already exists is left
/// untouched.
pub struct DemoSeedDataset;

impl DemoSeedDataset {
    pub fn pack_names() -> impl Iterator<Item = &'static str> {
        DEMO_PACKS.iter().map(|pack| pack.name)
    }

    pub async fn load(repository: &dyn PackRepository) -> Result<SeedResult, RepositoryError> {
        let existing = repository.list_packs().await?;
        let mut packs = Vec::with_capacity(DEMO_PACKS.len());

        for demo in DEMO_PACKS {
            if let Some(pack) = existing.iter().find(|pack| pack.name == demo.name) {
                packs.push(SeededPack {
                    name: demo.name,
                    pack_id: pack.id.clone(),
                    created: false,
                    description: demo.description,
                });
                continue;
            }

            let pack = repository.create_pack_with_products(demo.to_new_pack()).await?;
            packs.push(SeededPack {
                name: demo.name,
                pack_id: pack.id,
                created: true,
                description: demo.description,
            });
        }

        Ok(SeedResult { packs })
    }

    pub async fn verify(
        repository: &dyn PackRepository,
    ) -> Result<VerificationResult, RepositoryError> {
        let existing = repository.list_packs().await?;
        let checks = DEMO_PACKS
            .iter()
            .map(|demo| {
                let matches = existing.iter().any(|pack| {
                    pack.name == demo.name
                        && pack.discount == demo.discount
                        && pack.product_ids() == demo.product_ids()
                });
                (demo.name, matches)
            })
            .collect::<Vec<_>>();

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes every pack whose name belongs to the demo set.
    pub async fn clean(repository: &dyn PackRepository) -> Result<usize, RepositoryError> {
        let mut removed = 0;
        for pack in repository.list_packs().await? {
            if Self::pack_names().any(|name| name == pack.name)
                && repository.delete_pack(&pack.id).await?
            {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[derive(Debug, Clone, Copy)]
struct DemoPackContract {
    name: &'static str,
    discount: f64,
    product_ids: &'static [&'static str],
    description: &'static str,
}

impl DemoPackContract {
    fn product_ids(&self) -> Vec<ProductId> {
        self.product_ids.iter().map(|id| ProductId((*id).to_string())).collect()
    }

    fn to_new_pack(self) -> NewPack {
        NewPack {
            name: self.name.to_string(),
            discount: self.discount,
            product_ids: self.product_ids(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SeedResult {
    pub packs: Vec<SeededPack>,
}

impl SeedResult {
    pub fn created_count(&self) -> usize {
        self.packs.iter().filter(|pack| pack.created).count()
    }
}

#[derive(Debug, Serialize)]
pub struct SeededPack {
    pub name: &'static str,
    pub pack_id: PackId,
    pub created: bool,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
