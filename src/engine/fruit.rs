use crate::constants::{FRUIT_DROP_TILE, FRUIT_MAX_LIFETIME_MS, FRUIT_MIN_LIFETIME_MS};
use crate::position::TilePoint;
use crate::rng::Rng;
use crate::types::{FruitKind, FruitView};

#[derive(Clone, Debug)]
struct ActiveFruit {
    view: FruitView,
    remaining_ms: u64,
}

/// Bonus fruit: appears at fixed pellet counts, expires after a randomized countdown.
#[derive(Clone, Debug)]
pub struct FruitLifecycle {
    thresholds: [u32; 2],
    spawned: usize,
    active: Option<ActiveFruit>,
}

impl FruitLifecycle {
    pub fn new(thresholds: [u32; 2]) -> Self {
        Self {
            thresholds,
            spawned: 0,
            active: None,
        }
    }

    pub fn view(&self) -> Option<FruitView> {
        self.active.as_ref().map(|fruit| fruit.view.clone())
    }

    pub fn on_pellets_eaten(
        &mut self,
        pellets_eaten: u32,
        kind: FruitKind,
        rng: &mut Rng,
    ) -> Option<FruitView> {
        let threshold = *self.thresholds.get(self.spawned)?;
        if pellets_eaten < threshold {
            return None;
        }
        self.spawned += 1;
        let lifetime = rng.int(FRUIT_MIN_LIFETIME_MS, FRUIT_MAX_LIFETIME_MS);
        let view = FruitView {
            kind,
            value: kind.points(),
            row: FRUIT_DROP_TILE.0,
            col: FRUIT_DROP_TILE.1,
        };
        self.active = Some(ActiveFruit {
            view: view.clone(),
            remaining_ms: u64::try_from(lifetime).unwrap_or(0),
        });
        Some(view)
    }

    /// Counts the fruit down; returns true on the tick it expires.
    pub fn advance(&mut self, dt_ms: u64) -> bool {
        let Some(fruit) = self.active.as_mut() else {
            return false;
        };
        fruit.remaining_ms = fruit.remaining_ms.saturating_sub(dt_ms);
        if fruit.remaining_ms > 0 {
            return false;
        }
        self.active = None;
        true
    }

    pub fn try_consume(&mut self, tile: TilePoint) -> Option<FruitView> {
        let fruit = self.active.as_ref()?;
        if fruit.view.row != tile.row || fruit.view.col != tile.col {
            return None;
        }
        self.active.take().map(|fruit| fruit.view)
    }

    pub fn clear(&mut self) {
        self.active = None;
    }
}
