//! Scene state, animation and the per-frame draw sequence.

use std::f32::consts::PI;

use crate::assets::{self, ShaderLoadError, TextureLoadError};
use crate::backend::{
    BackendError, DrawCommand, Frame, GraphicsBackend, ProgramKind, ShaderHandle, TextureHandle,
};
use crate::geometry::{emit_box, model_view};
use crate::types::{AssetPaths, MissingTexturePolicy};

/// Degrees of yaw added per unit of elapsed time.
pub const YAW_RATE: f32 = 1.0;
/// Radians of light orbit added per unit of elapsed time.
pub const ORBIT_RATE: f32 = PI / 180.0;
/// Milliseconds per unit of elapsed time.
pub const TICKS_PER_UNIT: f32 = 100.0;

/// Color the wall texture is modulated with.
pub const WALL_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// Mutable per-scene animation state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SceneState {
    /// Pitch, yaw, roll in degrees, applied about X, Y, Z in that order.
    pub camera_rotation: [f32; 3],
    /// Point light position in world units. `z` stays zero.
    pub light_position: [f32; 3],
}

impl SceneState {
    pub fn yaw(&self) -> f32 {
        self.camera_rotation[1]
    }
}

/// Handles produced during initialisation and reused by every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SceneAssets {
    pub shader: ShaderHandle,
    pub texture: TextureHandle,
}

/// Advances [`SceneState`] from tick readings.
#[derive(Clone, Copy, Debug, Default)]
pub struct Animator {
    previous: Option<u32>,
    orbit: f32,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Light orbit angle in radians.
    pub fn orbit(&self) -> f32 {
        self.orbit
    }

    /// Applies the time since the previous reading to `state` and returns the
    /// elapsed time in animation units.
    ///
    /// The first reading only seeds the animator and yields zero. Readings
    /// wrap at `u32::MAX`; the difference is taken modulo 2^32.
    pub fn tick(&mut self, now: u32, state: &mut SceneState) -> f32 {
        let previous = self.previous.replace(now).unwrap_or(now);
        let elapsed = now.wrapping_sub(previous) as f32 / TICKS_PER_UNIT;

        state.camera_rotation[1] += YAW_RATE * elapsed;
        self.orbit += ORBIT_RATE * elapsed;
        state.light_position = [self.orbit.cos(), self.orbit.sin(), 0.0];

        elapsed
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error(transparent)]
    Shader(#[from] ShaderLoadError),
    #[error(transparent)]
    Texture(#[from] TextureLoadError),
    #[error("failed to create placeholder texture")]
    Placeholder(#[source] BackendError),
    #[error("failed to render frame")]
    Render(#[from] BackendError),
}

/// Builds the draw sequence for one frame. Pure in its inputs.
pub fn build_frame(state: &SceneState, assets: &SceneAssets) -> Frame {
    let mut frame = Frame::new();
    frame
        .push(DrawCommand::Clear {
            color: true,
            depth: true,
        })
        .push(DrawCommand::SetModelView(model_view(state.camera_rotation)))
        .push(DrawCommand::SetColor(WALL_COLOR))
        .push(DrawCommand::BindTexture(assets.texture))
        .push(DrawCommand::EnableProgram)
        .push(DrawCommand::BindProgram(assets.shader))
        .push(DrawCommand::Quads(emit_box(state.light_position)))
        .push(DrawCommand::DisableProgram)
        .push(DrawCommand::Present);
    frame
}

/// One lit box: its state, its animator and the assets loaded for it.
#[derive(Debug)]
pub struct Scene {
    state: SceneState,
    animator: Animator,
    assets: SceneAssets,
}

impl Scene {
    /// Loads the program and texture onto `backend`.
    ///
    /// The program is loaded first; a failure there leaves the backend
    /// without a texture. Texture decode failures follow `policy`.
    pub fn init<B: GraphicsBackend + ?Sized>(
        backend: &mut B,
        paths: &AssetPaths,
        policy: MissingTexturePolicy,
    ) -> Result<Self, SceneError> {
        let shader = assets::load_shader(backend, ProgramKind::Fragment, &paths.shader)?;
        let texture = match assets::load_texture(backend, &paths.texture) {
            Ok(handle) => handle,
            Err(err @ TextureLoadError::Decode { .. })
                if policy == MissingTexturePolicy::Placeholder =>
            {
                tracing::warn!(
                    error = %err,
                    "texture unavailable; continuing with white placeholder"
                );
                assets::load_placeholder_texture(backend).map_err(SceneError::Placeholder)?
            }
            Err(err) => return Err(err.into()),
        };

        Ok(Self::with_assets(SceneAssets { shader, texture }))
    }

    /// Wraps already-loaded handles.
    pub fn with_assets(assets: SceneAssets) -> Self {
        Self {
            state: SceneState::default(),
            animator: Animator::new(),
            assets,
        }
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn assets(&self) -> &SceneAssets {
        &self.assets
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    /// Advances animation with the reading `now` (milliseconds).
    pub fn tick(&mut self, now: u32) -> f32 {
        self.animator.tick(now, &mut self.state)
    }

    pub fn frame(&self) -> Frame {
        build_frame(&self.state, &self.assets)
    }

    pub fn render<B: GraphicsBackend + ?Sized>(&self, backend: &mut B) -> Result<(), SceneError> {
        backend.submit(&self.frame())?;
        Ok(())
    }

    /// Tick then render.
    pub fn cycle<B: GraphicsBackend + ?Sized>(
        &mut self,
        now: u32,
        backend: &mut B,
    ) -> Result<(), SceneError> {
        self.tick(now);
        self.render(backend)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::backend::recording::RecordingBackend;
    use crate::geometry::VERTEX_COUNT;
    use crate::pcx::tests::encode;

    fn write_assets(dir: &Path) -> AssetPaths {
        let shader = dir.join("shader.frag");
        let texture = dir.join("texture.pcx");
        std::fs::write(&shader, "void main() { outColor = vec4(v_light, 1.0); }\n").unwrap();
        std::fs::write(&texture, encode(2, 2, 3, &[128; 12], None)).unwrap();
        AssetPaths { shader, texture }
    }

    fn handles() -> SceneAssets {
        SceneAssets {
            shader: ShaderHandle::from_index(0),
            texture: TextureHandle::from_index(0),
        }
    }

    #[test]
    fn first_tick_has_zero_elapsed() {
        let mut animator = Animator::new();
        let mut state = SceneState::default();
        assert_eq!(animator.tick(123_456, &mut state), 0.0);
        assert_eq!(state.yaw(), 0.0);
        assert_eq!(state.light_position, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn hundred_milliseconds_is_one_degree_of_yaw() {
        let mut animator = Animator::new();
        let mut state = SceneState::default();
        animator.tick(1000, &mut state);
        let elapsed = animator.tick(1100, &mut state);

        assert_eq!(elapsed, 1.0);
        assert!((state.yaw() - 1.0).abs() < 1e-6);
        assert!((animator.orbit() - PI / 180.0).abs() < 1e-6);
        let expected = [(PI / 180.0).cos(), (PI / 180.0).sin(), 0.0];
        for axis in 0..3 {
            assert!((state.light_position[axis] - expected[axis]).abs() < 1e-6);
        }
    }

    #[test]
    fn yaw_is_monotonic_and_light_stays_on_unit_circle() {
        let mut animator = Animator::new();
        let mut state = SceneState::default();
        let mut last_yaw = f32::NEG_INFINITY;
        let mut now = 0u32;
        for step in [0, 16, 16, 33, 0, 250, 1, 1000] {
            now += step;
            animator.tick(now, &mut state);
            assert!(state.yaw() >= last_yaw);
            last_yaw = state.yaw();
            let [x, y, z] = state.light_position;
            assert!(((x * x + y * y) - 1.0).abs() < 1e-5);
            assert_eq!(z, 0.0);
        }
    }

    #[test]
    fn counter_wrap_yields_small_elapsed() {
        let mut animator = Animator::new();
        let mut state = SceneState::default();
        animator.tick(u32::MAX - 49, &mut state);
        assert_eq!(animator.tick(50, &mut state), 1.0);
    }

    #[test]
    fn frame_follows_draw_sequence() {
        let state = SceneState {
            camera_rotation: [0.0, 30.0, 0.0],
            light_position: [0.0, 1.0, 0.0],
        };
        let assets = handles();
        let frame = build_frame(&state, &assets);
        let commands = frame.commands();

        assert_eq!(commands.len(), 9);
        assert_eq!(
            commands[0],
            DrawCommand::Clear {
                color: true,
                depth: true
            }
        );
        assert_eq!(
            commands[1],
            DrawCommand::SetModelView(model_view([0.0, 30.0, 0.0]))
        );
        assert_eq!(commands[2], DrawCommand::SetColor(WALL_COLOR));
        assert_eq!(commands[3], DrawCommand::BindTexture(assets.texture));
        assert_eq!(commands[4], DrawCommand::EnableProgram);
        assert_eq!(commands[5], DrawCommand::BindProgram(assets.shader));
        match &commands[6] {
            DrawCommand::Quads(vertices) => {
                assert_eq!(vertices.len(), VERTEX_COUNT);
                assert_eq!(vertices, &emit_box([0.0, 1.0, 0.0]));
            }
            other => panic!("expected quads, found {other:?}"),
        }
        assert_eq!(commands[7], DrawCommand::DisableProgram);
        assert_eq!(commands[8], DrawCommand::Present);
    }

    #[test]
    fn frame_is_deterministic_for_unchanged_state() {
        let scene = Scene::with_assets(handles());
        assert_eq!(scene.frame(), scene.frame());
    }

    #[test]
    fn render_binds_the_loaded_handles_without_reallocating() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_assets(dir.path());
        let mut backend = RecordingBackend::default();

        let mut scene = Scene::init(&mut backend, &paths, MissingTexturePolicy::Fail).unwrap();
        for now in [0, 100, 200] {
            scene.cycle(now, &mut backend).unwrap();
        }

        assert_eq!(backend.programs.len(), 1);
        assert_eq!(backend.textures.len(), 1);
        assert_eq!(backend.frames.len(), 3);
        for frame in &backend.frames {
            assert!(frame
                .commands()
                .contains(&DrawCommand::BindProgram(scene.assets().shader)));
            assert!(frame
                .commands()
                .contains(&DrawCommand::BindTexture(scene.assets().texture)));
        }
        assert!((scene.state().yaw() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn missing_texture_fails_init_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = write_assets(dir.path());
        paths.texture = dir.path().join("gone.pcx");
        let mut backend = RecordingBackend::default();

        let err = Scene::init(&mut backend, &paths, MissingTexturePolicy::Fail).unwrap_err();
        assert!(matches!(
            err,
            SceneError::Texture(TextureLoadError::Decode { .. })
        ));
        assert!(backend.textures.is_empty());
    }

    #[test]
    fn missing_texture_uses_placeholder_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = write_assets(dir.path());
        paths.texture = dir.path().join("gone.pcx");
        let mut backend = RecordingBackend::default();

        let scene = Scene::init(&mut backend, &paths, MissingTexturePolicy::Placeholder).unwrap();
        assert_eq!(backend.textures.len(), 1);
        assert_eq!(backend.textures[0].0, 1);
        assert_eq!(scene.assets().texture, TextureHandle::from_index(0));
    }

    #[test]
    fn scenes_are_independent() {
        let mut first = Scene::with_assets(handles());
        let mut second = Scene::with_assets(handles());
        first.tick(0);
        first.tick(500);
        second.tick(0);
        assert!((first.state().yaw() - 5.0).abs() < 1e-6);
        assert_eq!(second.state().yaw(), 0.0);
    }
}
