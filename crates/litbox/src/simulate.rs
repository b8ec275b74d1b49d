use std::io::Write;

use anyhow::Result;
use renderer::{Animator, SceneState, SteppedTickSource, TickSource};

use crate::cli::SimulateArgs;

/// Drives the animator from a fixed-step clock and writes one line per tick.
pub fn simulate(args: &SimulateArgs, out: &mut impl Write) -> Result<()> {
    let mut ticks = SteppedTickSource::new(args.start_ms, args.step_ms);
    let mut animator = Animator::new();
    let mut state = SceneState::default();

    for index in 0..args.ticks {
        let now = ticks.ticks();
        let elapsed = animator.tick(now, &mut state);
        let [lx, ly, lz] = state.light_position;
        writeln!(
            out,
            "tick {index} t={now}ms elapsed={elapsed:.3} yaw={:.3} orbit={:.4} light=({lx:.4}, {ly:.4}, {lz:.4})",
            state.yaw(),
            animator.orbit(),
        )?;
    }
    tracing::debug!(ticks = args.ticks, step_ms = args.step_ms, "simulation finished");
    Ok(())
}
