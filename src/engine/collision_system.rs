use super::*;

use crate::constants::{
    GHOST_EATEN_FREEZE_MS, LOST_LIFE_STOPPED_MS, MAZE_FLASH_MS, PELLET_POINTS, POWER_PELLET_POINTS,
};
use crate::engine::utils::ghost_points;
use crate::maze::TileType;

impl Orchestrator {
    /// Returns true when the player lost a life this frame.
    pub(super) fn check_collisions(&mut self, out: &mut Vec<Envelope>) -> bool {
        let Some(player) = self.committed.get(&AgentId::Player) else {
            return false;
        };
        let player_tile = player.position.tile();

        for ghost in GhostName::ALL {
            let Some(update) = self.committed.get(&AgentId::Ghost(ghost)) else {
                continue;
            };
            if update.position.tile() != player_tile || self.dead_ghosts.contains(&ghost) {
                continue;
            }
            if update.tags.contains(&ModeTag::Dead) || update.tags.contains(&ModeTag::ReturningHome)
            {
                continue;
            }
            // a reply tagged before the frightened period ended is not eatable
            let vulnerable = update.tags.contains(&ModeTag::Frightened)
                && self.scheduler.frightened_phase().is_some()
                && !self.revived_ghosts.contains(&ghost);
            if vulnerable {
                self.eat_ghost(ghost, out);
            } else {
                self.lose_life(ghost, out);
                return true;
            }
        }
        false
    }

    fn eat_ghost(&mut self, ghost: GhostName, out: &mut Vec<Envelope>) {
        let points = ghost_points(self.fright_chain);
        self.fright_chain += 1;
        self.score.ghosts_eaten += 1;
        self.dead_ghosts.insert(ghost);
        self.add_points(points);
        debug!(?ghost, points, "pursuer eaten");
        self.events.push(RuntimeEvent::GhostEaten { ghost, points });

        out.push(Envelope::notify(AgentId::Ghost(ghost), Notification::Eaten));
        broadcast(out, Notification::Pause);
        self.phase = LevelPhase::Playing {
            freeze_ms: GHOST_EATEN_FREEZE_MS,
        };
        self.scheduler.set_frozen(true);
    }

    fn lose_life(&mut self, ghost: GhostName, out: &mut Vec<Envelope>) {
        self.lives = self.lives.saturating_sub(1);
        info!(?ghost, lives = self.lives, "life lost");
        self.events.push(RuntimeEvent::LifeLost {
            lives_remaining: self.lives,
        });
        self.phase = LevelPhase::LostLife {
            stage: LostLifeStage::Stopped,
            remaining_ms: LOST_LIFE_STOPPED_MS,
        };
        self.fright_chain = 0;
        self.house.on_life_lost();
        if self.fruit.view().is_some() {
            self.fruit.clear();
            self.events.push(RuntimeEvent::FruitExpired);
        }
        broadcast(out, Notification::Pause);
    }

    /// Pellet, then power pellet, then fruit; at most one per frame.
    pub(super) fn check_consumption(&mut self, out: &mut Vec<Envelope>) {
        let Some(player) = self.committed.get(&AgentId::Player) else {
            return;
        };
        let tile = player.position.tile();

        match self.maze.get_tile_type(tile) {
            TileType::Pellet => {
                self.maze.set_tile_type(tile, TileType::Empty);
                self.events.push(RuntimeEvent::PelletEaten {
                    row: tile.row,
                    col: tile.col,
                });
                out.push(Envelope::notify(AgentId::Player, Notification::AtePellet));
                self.add_points(PELLET_POINTS);
                self.count_pellet(out);
            }
            TileType::PowerPellet => {
                self.maze.set_tile_type(tile, TileType::Empty);
                self.events.push(RuntimeEvent::PowerPelletEaten {
                    row: tile.row,
                    col: tile.col,
                });
                out.push(Envelope::notify(
                    AgentId::Player,
                    Notification::AtePowerPellet,
                ));
                self.add_points(POWER_PELLET_POINTS);
                self.count_pellet(out);
                self.start_frightened(out);
            }
            _ => {
                if let Some(fruit) = self.fruit.try_consume(tile) {
                    self.add_points(fruit.value);
                    self.events.push(RuntimeEvent::FruitEaten { fruit });
                }
            }
        }
    }

    fn count_pellet(&mut self, out: &mut Vec<Envelope>) {
        self.score.pellets_eaten += 1;
        self.score.level_pellets += 1;
        if let Some(ghost) = self.house.on_pellet_eaten() {
            self.release_ghost(ghost, out);
        }
        let spawned = self.fruit.on_pellets_eaten(
            self.score.level_pellets,
            self.level_config.fruit,
            &mut self.rng,
        );
        if let Some(fruit) = spawned {
            self.events.push(RuntimeEvent::FruitSpawned { fruit });
        }
    }

    fn start_frightened(&mut self, out: &mut Vec<Envelope>) {
        if !self.scheduler.start_frightened() {
            return;
        }
        self.fright_chain = 0;
        self.revived_ghosts.extend(self.dead_ghosts.iter().copied());
        self.events.push(RuntimeEvent::FrightenedStarted);
        out.push(Envelope::notify(AgentId::Player, Notification::Frightened));
        for ghost in GhostName::ALL {
            if !self.dead_ghosts.contains(&ghost) {
                out.push(Envelope::notify(
                    AgentId::Ghost(ghost),
                    Notification::Frightened,
                ));
            }
        }
    }

    fn add_points(&mut self, points: u64) {
        self.score.total_points += points;
        if !self.score.extra_life_awarded && self.score.total_points >= self.config.extra_life_score
        {
            self.score.extra_life_awarded = true;
            self.lives += 1;
            info!(lives = self.lives, "extra life");
            self.events.push(RuntimeEvent::ExtraLife);
        }
    }

    pub(super) fn check_win(&mut self, out: &mut Vec<Envelope>) {
        if self.maze.pellets_remaining() > 0 {
            return;
        }
        info!(level = self.level, points = self.score.total_points, "level complete");
        self.events.push(RuntimeEvent::LevelComplete { level: self.level });
        self.phase = LevelPhase::LevelComplete {
            stage: LevelCompleteStage::MazeFlash,
            remaining_ms: MAZE_FLASH_MS,
        };
        self.scheduler.set_frozen(false);
        self.fruit.clear();
        broadcast(out, Notification::Pause);
    }
}
