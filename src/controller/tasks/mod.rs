//! Boss behaviors
//!
//! Each behavior is a [`BossTask`](super::scheduler::BossTask). The standard
//! roster below fixes their priorities and resource claims.
//!
//! ## Priority Order
//!
//! | Priority | Task            | Claims             |
//! |----------|-----------------|--------------------|
//! | 0        | Void beam       | move, look, weapon |
//! | 1        | Void burst      | move, look, weapon |
//! | 2        | Grab            | move, look, weapon |
//! | 3        | Running combo   | move, look, weapon |
//! | 4        | Left hand       | move, look, weapon |
//! | 5        | Berserk combo   | move, look, weapon |
//! | 6        | Slash           | move, look, weapon |
//! | 7        | Dual slam       | move, look, weapon |
//! | 8        | Chase           | move, look         |
//! | 9        | Wander          | move               |

pub mod beam;
pub mod burst;
pub mod grab;
pub mod locomotion;
pub mod melee;

use super::scheduler::{MutexBits, TaskScheduler};

pub use beam::BeamTask;
pub use burst::BurstTask;
pub use grab::GrabTask;
pub use locomotion::{ChaseTask, WanderTask};
pub use melee::{BerserkComboTask, DualSlamTask, LeftHandTask, RunningComboTask, SlashTask};

/// Scheduler loaded with every boss behavior
pub fn standard_scheduler() -> TaskScheduler {
    let mut scheduler = TaskScheduler::new();
    scheduler.register(0, MutexBits::ATTACK, Box::new(BeamTask));
    scheduler.register(1, MutexBits::ATTACK, Box::new(BurstTask));
    scheduler.register(2, MutexBits::ATTACK, Box::new(GrabTask));
    scheduler.register(3, MutexBits::ATTACK, Box::new(RunningComboTask::default()));
    scheduler.register(4, MutexBits::ATTACK, Box::new(LeftHandTask));
    scheduler.register(5, MutexBits::ATTACK, Box::new(BerserkComboTask));
    scheduler.register(6, MutexBits::ATTACK, Box::new(SlashTask));
    scheduler.register(7, MutexBits::ATTACK, Box::new(DualSlamTask));
    scheduler.register(8, MutexBits::MOVE.union(MutexBits::LOOK), Box::new(ChaseTask));
    scheduler.register(9, MutexBits::MOVE, Box::new(WanderTask::default()));
    scheduler
}
