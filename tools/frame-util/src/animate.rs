use crate::scatter::ScatterPlot;
use crate::sink::FrameSink;
use anyhow::{ensure, Context, Result};
use nbody_anim::Trajectory;

/// Render every step of `trajectory` in order into `sink`, then finish it.
///
/// Returns the number of frames written.
pub fn animate(
    trajectory: &Trajectory,
    plot: &mut ScatterPlot,
    mut sink: Box<dyn FrameSink>,
) -> Result<usize> {
    let n_frame = trajectory.num_steps();
    ensure!(n_frame > 0, "trajectory has no steps to animate");

    for step in 0..n_frame {
        let img = plot
            .render(trajectory.xs(step), trajectory.ys(step), step, n_frame)
            .with_context(|| format!("failed to render step {}", step + 1))?;
        sink.push(&img)
            .with_context(|| format!("failed to write step {}", step + 1))?;

        log::debug!("step {}/{}", step + 1, n_frame);
        eprint!("\r {} / {}", step + 1, n_frame);
    }
    eprintln!();

    sink.finish().context("failed to finalize output")?;
    log::info!("Wrote {} frames", n_frame);

    Ok(n_frame)
}
