//! Named sprite animation clips and deterministic playback.
//!
//! A clip is an ordered sequence of atlas frame names played at a fixed frame
//! rate, either looping forever or playing once and holding its last frame.
//! Clips are registered once at scene setup and referenced by name thereafter.
//!
//! All timing uses integer microseconds (`u64`) so advancement under the
//! fixed-timestep model is deterministic -- no floating-point drift across
//! platforms.

use std::collections::HashMap;

/// Repeat policy for a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    /// Wrap back to the first frame forever.
    Loop,
    /// Play through once, then hold the last frame.
    Once,
}

/// A named, ordered sequence of atlas frame names with a playback rate.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    pub frames: Vec<String>,
    pub frame_rate: u32,
    pub repeat: Repeat,
}

impl AnimationClip {
    /// Duration of one frame in microseconds.
    pub fn frame_duration_us(&self) -> u64 {
        1_000_000 / self.frame_rate as u64
    }
}

/// Registry of clips, populated once at setup.
#[derive(Debug, Default)]
pub struct AnimationRegistry {
    clips: HashMap<String, AnimationClip>,
}

impl AnimationRegistry {
    pub fn new() -> Self {
        Self {
            clips: HashMap::new(),
        }
    }

    pub fn register(&mut self, name: &str, clip: AnimationClip) -> Result<(), String> {
        if clip.frames.is_empty() {
            return Err(format!(
                "Animation registration failed: clip '{}' has no frames",
                name
            ));
        }
        if clip.frame_rate == 0 {
            return Err(format!(
                "Animation registration failed: clip '{}' has zero frame rate",
                name
            ));
        }
        if self.clips.contains_key(name) {
            return Err(format!(
                "Animation registration failed: duplicate clip '{}'",
                name
            ));
        }
        self.clips.insert(name.to_string(), clip);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&AnimationClip> {
        self.clips.get(name)
    }
}

/// Playback state for one animated sprite.
#[derive(Debug, Clone, Default)]
pub struct AnimationPlayer {
    pub clip_name: Option<String>,
    pub frame_index: usize,
    pub elapsed_us: u64,
    pub finished: bool,
}

impl AnimationPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch to `name`. With `ignore_if_playing`, a clip that is already
    /// active and not finished keeps its current frame position instead of
    /// restarting -- the controller calls this every tick for looping clips.
    pub fn play(&mut self, name: &str, ignore_if_playing: bool) {
        if ignore_if_playing && !self.finished && self.clip_name.as_deref() == Some(name) {
            return;
        }
        self.clip_name = Some(name.to_string());
        self.frame_index = 0;
        self.elapsed_us = 0;
        self.finished = false;
    }

    /// Advance by `dt_us` against the active clip. A `Repeat::Once` clip holds
    /// its last frame after finishing.
    pub fn tick(&mut self, dt_us: u64, registry: &AnimationRegistry) {
        let Some(clip) = self.clip_name.as_deref().and_then(|n| registry.get(n)) else {
            return;
        };
        if self.finished {
            return;
        }

        self.elapsed_us += dt_us;
        let frame_us = clip.frame_duration_us();
        while self.elapsed_us >= frame_us {
            self.elapsed_us -= frame_us;
            self.frame_index += 1;
            if self.frame_index >= clip.frames.len() {
                match clip.repeat {
                    Repeat::Loop => self.frame_index = 0,
                    Repeat::Once => {
                        self.frame_index = clip.frames.len() - 1;
                        self.elapsed_us = 0;
                        self.finished = true;
                        break;
                    }
                }
            }
        }
    }

    /// The atlas frame name to draw this tick.
    pub fn current_frame<'a>(&self, registry: &'a AnimationRegistry) -> Option<&'a str> {
        let clip = self.clip_name.as_deref().and_then(|n| registry.get(n))?;
        clip.frames.get(self.frame_index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP_US: u64 = 16_667; // ~60fps fixed step

    fn make_registry() -> AnimationRegistry {
        let mut registry = AnimationRegistry::new();
        registry
            .register(
                "walk",
                AnimationClip {
                    frames: (0..4).map(|i| format!("walk{}.png", i)).collect(),
                    frame_rate: 10,
                    repeat: Repeat::Loop,
                },
            )
            .unwrap();
        registry
            .register(
                "jump",
                AnimationClip {
                    frames: (0..3).map(|i| format!("jump{}.png", i)).collect(),
                    frame_rate: 14,
                    repeat: Repeat::Once,
                },
            )
            .unwrap();
        registry
    }

    #[test]
    fn register_rejects_empty_frames() {
        let mut registry = AnimationRegistry::new();
        let err = registry
            .register(
                "bad",
                AnimationClip {
                    frames: vec![],
                    frame_rate: 10,
                    repeat: Repeat::Loop,
                },
            )
            .expect_err("empty clip should fail");
        assert!(err.contains("no frames"));
    }

    #[test]
    fn register_rejects_duplicate_name() {
        let mut registry = make_registry();
        let err = registry
            .register(
                "walk",
                AnimationClip {
                    frames: vec!["a.png".to_string()],
                    frame_rate: 10,
                    repeat: Repeat::Loop,
                },
            )
            .expect_err("duplicate should fail");
        assert!(err.contains("duplicate clip"));
    }

    #[test]
    fn tick_advances_at_frame_rate() {
        let registry = make_registry();
        let mut player = AnimationPlayer::new();
        player.play("walk", false);
        assert_eq!(player.current_frame(&registry), Some("walk0.png"));

        // 10fps => 100ms per frame; 50ms stays on frame 0.
        player.tick(50_000, &registry);
        assert_eq!(player.current_frame(&registry), Some("walk0.png"));

        // Another 60ms (110ms total) crosses into frame 1.
        player.tick(60_000, &registry);
        assert_eq!(player.current_frame(&registry), Some("walk1.png"));
    }

    #[test]
    fn looping_clip_wraps_around() {
        let registry = make_registry();
        let mut player = AnimationPlayer::new();
        player.play("walk", false);

        // 4 frames * 100ms = 400ms per cycle; 410ms lands back on frame 0.
        player.tick(410_000, &registry);
        assert_eq!(player.frame_index, 0);
        assert!(!player.finished);
    }

    #[test]
    fn play_once_holds_last_frame() {
        let registry = make_registry();
        let mut player = AnimationPlayer::new();
        player.play("jump", false);

        // 14fps => ~71.4ms per frame, 3 frames ~214ms. Run well past the end.
        player.tick(400_000, &registry);
        assert!(player.finished);
        assert_eq!(player.current_frame(&registry), Some("jump2.png"));

        // Further ticks stay on the last frame.
        player.tick(STEP_US, &registry);
        assert_eq!(player.current_frame(&registry), Some("jump2.png"));
    }

    #[test]
    fn play_with_ignore_suppresses_restart() {
        let registry = make_registry();
        let mut player = AnimationPlayer::new();
        player.play("walk", true);
        player.tick(110_000, &registry);
        assert_eq!(player.frame_index, 1);

        // Re-playing the active clip must not reset the frame position.
        player.play("walk", true);
        assert_eq!(player.frame_index, 1);

        // But switching clips always restarts.
        player.play("jump", true);
        assert_eq!(player.frame_index, 0);
    }

    #[test]
    fn finished_once_clip_can_be_replayed() {
        let registry = make_registry();
        let mut player = AnimationPlayer::new();
        player.play("jump", true);
        player.tick(400_000, &registry);
        assert!(player.finished);

        // A finished play-once clip counts as not playing, so ignore_if_playing
        // does not suppress the restart.
        player.play("jump", true);
        assert!(!player.finished);
        assert_eq!(player.frame_index, 0);
    }

    #[test]
    fn determinism_identical_results() {
        let registry = make_registry();
        let mut player_a = AnimationPlayer::new();
        let mut player_b = AnimationPlayer::new();
        player_a.play("walk", false);
        player_b.play("walk", false);

        for _ in 0..500 {
            player_a.tick(STEP_US, &registry);
            player_b.tick(STEP_US, &registry);
            assert_eq!(player_a.frame_index, player_b.frame_index);
        }
        assert_eq!(player_a.elapsed_us, player_b.elapsed_us);
    }

    #[test]
    fn tick_without_clip_is_no_op() {
        let registry = make_registry();
        let mut player = AnimationPlayer::new();
        player.tick(STEP_US, &registry);
        assert_eq!(player.current_frame(&registry), None);
        assert_eq!(player.frame_index, 0);
    }
}
