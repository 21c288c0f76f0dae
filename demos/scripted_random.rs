use gym_dm_atari::{
    save_frame_png, save_png, DmAtariConfig, DmAtariEnv, Emulator, Env, RecordEpisodeStatistics, RenderFrame,
    ScriptedEmulator,
};
use minifb::{Key, KeyRepeat, Window, WindowOptions};
use ndarray::Axis;
use rand::Rng;

fn rgba_to_u32(a: u8, r: u8, g: u8, b: u8) -> u32 {
    // Minifb expects ARGB on most platforms; construct accordingly.
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

fn main() -> gym_dm_atari::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let emulator = ScriptedEmulator::default()
        .with_flicker(true)
        .with_rewards(vec![0, 0, 1])
        .with_life_loss_at(vec![120, 240, 360]);
    let config = DmAtariConfig::default().game("scripted").render_hist(true);
    let n_actions = emulator.minimal_action_set().len();
    let mut env = RecordEpisodeStatistics::new(DmAtariEnv::new(emulator, config)?);
    env.reset(Some(123))?;

    let (width, height) = match env.render() {
        Some(RenderFrame::Pixels { width, height, .. }) => (width as usize, height as usize),
        _ => {
            eprintln!("Environment did not produce a pixel frame.");
            return Ok(());
        }
    };

    let mut window = Window::new("gym-dm-atari: scripted_random", width, height, WindowOptions::default())
        .expect("Unable to open window");

    let mut buffer: Vec<u32> = vec![0; width * height];
    let mut rng = rand::thread_rng();

    // Run until window is closed or Escape pressed; S saves the current frames as PNG.
    while window.is_open() && !window.is_key_down(Key::Escape) {
        let action = rng.gen_range(0..n_actions);
        let step = env.step(action)?;
        if step.terminated || step.truncated {
            if let Some(ret) = step.info.get("episode_return") {
                log::info!("episode finished, return {:?}", ret);
            }
            env.reset(None)?;
        }

        if window.is_key_pressed(Key::S, KeyRepeat::No) {
            save_snapshot(&env);
        }

        if let Some(RenderFrame::Pixels { width, height, data }) = env.render() {
            // Convert RGBA bytes to ARGB u32s for minifb
            for (dst, px) in buffer.iter_mut().zip(data.chunks_exact(4)) {
                *dst = rgba_to_u32(px[3], px[0], px[1], px[2]);
            }
            window
                .update_with_buffer(&buffer, width as usize, height as usize)
                .expect("Failed to update window buffer");
        }
    }
    Ok(())
}

/// Saves the rendered window and the newest processed frame the agent sees.
fn save_snapshot(env: &RecordEpisodeStatistics<DmAtariEnv<ScriptedEmulator>>) {
    if let Some(frame) = env.render() {
        match save_png("scripted_random_render.png", &frame) {
            Ok(()) => log::info!("saved scripted_random_render.png"),
            Err(e) => log::warn!("could not save render: {}", e),
        }
    }
    let obs = env.inner().observation();
    match save_frame_png("scripted_random_obs.png", obs.index_axis(Axis(0), 0)) {
        Ok(()) => log::info!("saved scripted_random_obs.png"),
        Err(e) => log::warn!("could not save observation: {}", e),
    }
}
