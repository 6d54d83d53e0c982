//! Menina -- main loop and application entry point.
//!
//! Architecture: winit drives the event loop via `ApplicationHandler`. All
//! simulation runs inside `RedrawRequested` using a **fixed-timestep** model
//! (see `TimeState`):
//!
//!   1. `begin_frame()` -- measure wall-clock delta, feed accumulator
//!   2. `while should_step()` -- scene tick, then physics step, contacts
//!      carried into the next tick
//!   3. Rebuild the sprite mesh from the tilemap, the player, and the
//!      physics debug overlay
//!   4. Upload camera uniform, issue draw calls, composite egui overlay
//!
//! The world simulates in tilemap pixel coordinates (y-down) with velocities
//! in pixels per fixed tick; the camera projection matches that convention.

mod assets;
mod atlas;
mod physics;
mod scene;
mod tilemap;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use assets::AssetServer;
use mnp_core::input::{InputState, Key};
use mnp_core::time::TimeState;
use mnp_devtools::{DebugOverlay, OverlayStats};
use mnp_platform::window::PlatformConfig;
use mnp_render::{Camera2D, GpuContext, SpritePipeline, SpriteVertex, Texture};
use physics::{ContactEvent, PhysicsWorld};
use scene::{CursorBindings, Facing, GameScene, Scene, SPRITE_SCALE};

const ASSET_ROOT: &str = "assets";
const ATLAS_ASSET: &str = "__atlas";
const TILES_ASSET: &str = "__tiles";
const DEBUG_WHITE_ASSET: &str = "__debug_white";

/// A contiguous run of indices that share the same texture binding.
/// Draw calls are merged when consecutive quads use the same texture,
/// minimizing GPU bind-group switches during the render pass.
#[derive(Debug, Clone)]
struct DrawCall {
    texture_key: Arc<str>,
    index_start: u32,
    index_count: u32,
}

/// A textured quad in world space. `left`/`top` are the smaller coordinates
/// in the y-down world; `uv` is the source rect in texture space.
struct QuadSpec<'a> {
    texture_key: &'a str,
    left: f32,
    top: f32,
    width: f32,
    height: f32,
    uv: [f32; 4],
    color: [f32; 4],
}

struct GpuSpriteTexture {
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

/// All mutable engine state lives here. Constructed lazily in
/// `ApplicationHandler::resumed` once the window and GPU surface exist.
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    input: InputState,
    camera: Camera2D,
    sprite_pipeline: SpritePipeline,
    debug_overlay: DebugOverlay,

    assets: AssetServer,
    scene: GameScene,
    world: PhysicsWorld,
    contacts: Vec<ContactEvent>,
    show_physics_debug: bool,
    textures: HashMap<Arc<str>, GpuSpriteTexture>,

    // The sprite mesh is rebuilt on the CPU each simulated frame, then
    // streamed into these GPU buffers. Buffers grow (power-of-two) but
    // never shrink.
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
    draw_calls: Vec<DrawCall>,
    sprite_count: usize,
}

impl EngineState {
    fn new(window: Arc<Window>, config: &PlatformConfig) -> Self {
        let gpu = GpuContext::new(window.clone())
            .unwrap_or_else(|err| panic!("Failed to initialize GPU: {}", err));
        let time = TimeState::new();
        let input = InputState::new();
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let debug_overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);

        // winit always delivers keyboard events for a desktop window, so the
        // default bindings are handed to the scene unconditionally.
        let mut scene = GameScene::new(Path::new(ASSET_ROOT));
        if let Err(err) = scene.init(Some(CursorBindings::default())) {
            panic!("Failed to initialize scene: {}", err);
        }

        let mut assets = AssetServer::new();
        scene.load(&mut assets);
        if let Err(err) = assets.load_all() {
            panic!("Failed to load initial content: {}", err);
        }

        let mut world = PhysicsWorld::new();
        if let Err(err) = scene.setup(&assets, &mut world) {
            panic!("Failed to set up scene: {}", err);
        }

        let mut camera = Camera2D::new(gpu.size.0, gpu.size.1);
        if let Some((x, y)) = scene.camera_target(&world) {
            camera.follow(x, y);
        }

        let camera_uniform = camera.build_uniform();
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera_uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        let mut state = Self {
            window,
            gpu,
            time,
            input,
            camera,
            sprite_pipeline,
            debug_overlay,
            assets,
            scene,
            world,
            contacts: Vec::new(),
            show_physics_debug: config.physics_debug,
            textures: HashMap::new(),
            vertex_buffer,
            index_buffer,
            camera_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
            draw_calls: Vec::new(),
            sprite_count: 0,
        };

        // Startup order matters: load textures before building the first mesh.
        state.upload_content_textures();
        state.ensure_mesh_capacity(4, 6);
        state.rebuild_scene_mesh();
        state
    }

    fn upload_content_textures(&mut self) {
        if let Some(path) = self.assets.atlas_image_path() {
            let texture = load_texture_asset(
                &self.gpu.device,
                &self.gpu.queue,
                &self.sprite_pipeline,
                path,
            );
            self.textures.insert(Arc::from(ATLAS_ASSET), texture);
        }
        if let Some(path) = self.assets.image_path("tiles") {
            let texture = load_texture_asset(
                &self.gpu.device,
                &self.gpu.queue,
                &self.sprite_pipeline,
                path,
            );
            self.textures.insert(Arc::from(TILES_ASSET), texture);
        }

        let texture = Texture::from_rgba8(
            &self.gpu.device,
            &self.gpu.queue,
            &[255, 255, 255, 255],
            1,
            1,
            "debug_white",
        );
        let bind_group = self
            .sprite_pipeline
            .create_texture_bind_group(&self.gpu.device, &texture);
        self.textures.insert(
            Arc::from(DEBUG_WHITE_ASSET),
            GpuSpriteTexture {
                texture,
                bind_group,
            },
        );
    }

    fn rebuild_scene_mesh(&mut self) {
        // Build a single CPU-side mesh from the tilemap, the player sprite,
        // and debug overlays, then stream it into GPU buffers.
        let (vertices, indices, draw_calls) = self.build_mesh();
        self.ensure_mesh_capacity(vertices.len(), indices.len());
        self.sprite_count = vertices.len() / 4;
        self.draw_calls = draw_calls;

        if !vertices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        }
        if !indices.is_empty() {
            self.gpu
                .queue
                .write_buffer(&self.index_buffer, 0, bytemuck::cast_slice(&indices));
        }
    }

    fn build_mesh(&self) -> (Vec<SpriteVertex>, Vec<u32>, Vec<DrawCall>) {
        let mut vertices = Vec::with_capacity(1024);
        let mut indices = Vec::with_capacity(1536);
        let mut draw_calls = Vec::with_capacity(8);

        self.build_tile_mesh(&mut vertices, &mut indices, &mut draw_calls);
        self.build_player_mesh(&mut vertices, &mut indices, &mut draw_calls);
        if self.show_physics_debug {
            self.build_debug_mesh(&mut vertices, &mut indices, &mut draw_calls);
        }

        (vertices, indices, draw_calls)
    }

    fn build_tile_mesh(
        &self,
        vertices: &mut Vec<SpriteVertex>,
        indices: &mut Vec<u32>,
        draw_calls: &mut Vec<DrawCall>,
    ) {
        let Some(map) = self.assets.tilemap() else {
            return;
        };
        let Some(tiles_texture) = self.textures.get(TILES_ASSET) else {
            return;
        };
        let (tex_w, tex_h) = tiles_texture.texture.size;
        if tex_w == 0 || tex_h == 0 {
            return;
        }

        let tile_w = map.tile_width as f32;
        let tile_h = map.tile_height as f32;

        // Layers render in authored order, all from the same tileset sheet,
        // so the whole map collapses into one draw call.
        for layer in map.tile_layers() {
            for (index, &gid) in layer.data.iter().enumerate() {
                let Some((sx, sy, sw, sh)) = map.tile_source_rect(gid) else {
                    continue;
                };
                let cell_x = (index as i32 % map.width) as f32;
                let cell_y = (index as i32 / map.width) as f32;
                add_quad(
                    vertices,
                    indices,
                    draw_calls,
                    QuadSpec {
                        texture_key: TILES_ASSET,
                        left: cell_x * tile_w,
                        top: cell_y * tile_h,
                        width: tile_w,
                        height: tile_h,
                        uv: [
                            sx as f32 / tex_w as f32,
                            sy as f32 / tex_h as f32,
                            (sx + sw) as f32 / tex_w as f32,
                            (sy + sh) as f32 / tex_h as f32,
                        ],
                        color: [1.0, 1.0, 1.0, 1.0],
                    },
                );
            }
        }
    }

    fn build_player_mesh(
        &self,
        vertices: &mut Vec<SpriteVertex>,
        indices: &mut Vec<u32>,
        draw_calls: &mut Vec<DrawCall>,
    ) {
        let Some(body_id) = self.scene.player_body() else {
            return;
        };
        let Some(atlas) = self.assets.atlas() else {
            return;
        };
        let Some(frame_name) = self.scene.current_frame() else {
            return;
        };
        let Some(frame) = atlas.resolve(frame_name) else {
            log::warn!("Animation frame '{}' missing from atlas", frame_name);
            return;
        };

        let aabb = self.world.body(body_id).aabb;
        let sprite_w = frame.size_px.0 as f32 * SPRITE_SCALE;
        let sprite_h = frame.size_px.1 as f32 * SPRITE_SCALE;

        // The origin anchors the sprite over the body center, so the art
        // lines up with the smaller collision rect.
        let (origin_x, origin_y) = self.scene.sprite_origin();
        let left = aabb.center_x - sprite_w * origin_x;
        let top = aabb.center_y - sprite_h * origin_y;

        // Facing left mirrors the frame by swapping the horizontal UVs.
        let [u0, v0, u1, v1] = frame.uv;
        let uv = match self.scene.facing() {
            Facing::Right => [u0, v0, u1, v1],
            Facing::Left => [u1, v0, u0, v1],
        };

        add_quad(
            vertices,
            indices,
            draw_calls,
            QuadSpec {
                texture_key: ATLAS_ASSET,
                left,
                top,
                width: sprite_w,
                height: sprite_h,
                uv,
                color: [1.0, 1.0, 1.0, 1.0],
            },
        );
    }

    fn build_debug_mesh(
        &self,
        vertices: &mut Vec<SpriteVertex>,
        indices: &mut Vec<u32>,
        draw_calls: &mut Vec<DrawCall>,
    ) {
        // Solid collision cells as translucent green quads.
        if let Some(geometry) = self.world.geometry() {
            let cell = geometry.cell_size as f32;
            for &(x, y) in geometry.solids_iter() {
                add_quad(
                    vertices,
                    indices,
                    draw_calls,
                    QuadSpec {
                        texture_key: DEBUG_WHITE_ASSET,
                        left: x as f32 * cell,
                        top: y as f32 * cell,
                        width: cell,
                        height: cell,
                        uv: [0.0, 0.0, 1.0, 1.0],
                        color: [0.15, 0.9, 0.15, 0.35],
                    },
                );
            }
        }

        // Player collision body as a translucent red quad.
        if let Some(body_id) = self.scene.player_body() {
            let aabb = self.world.body(body_id).aabb;
            add_quad(
                vertices,
                indices,
                draw_calls,
                QuadSpec {
                    texture_key: DEBUG_WHITE_ASSET,
                    left: aabb.center_x - aabb.half_w,
                    top: aabb.center_y - aabb.half_h,
                    width: aabb.half_w * 2.0,
                    height: aabb.half_h * 2.0,
                    uv: [0.0, 0.0, 1.0, 1.0],
                    color: [1.0, 0.3, 0.3, 0.45],
                },
            );
        }
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }

        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }
}

struct App {
    config: PlatformConfig,
    state: Option<EngineState>,
}

impl App {
    fn new() -> Self {
        Self {
            config: PlatformConfig::default(),
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = mnp_platform::window::create_window(event_loop, &self.config);
        log::info!(
            "Window created: {}x{}",
            self.config.width,
            self.config.height
        );
        self.state = Some(EngineState::new(window, &self.config));
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state
            .debug_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    state.camera.viewport = (w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(engine_key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => state.input.key_down(engine_key),
                            ElementState::Released => state.input.key_up(engine_key),
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                if state.gpu.size.0 == 0 || state.gpu.size.1 == 0 {
                    return;
                }

                // Fixed-step simulation phase.
                state.time.begin_frame();
                while state.time.should_step() {
                    if state.input.is_just_pressed(Key::Escape) {
                        event_loop.exit();
                        return;
                    }
                    if state.input.is_just_pressed(Key::F3) {
                        state.debug_overlay.toggle();
                    }
                    if state.input.is_just_pressed(Key::F4) {
                        state.show_physics_debug = !state.show_physics_debug;
                        log::info!(
                            "Physics debug: {}",
                            if state.show_physics_debug { "ON" } else { "OFF" }
                        );
                    }

                    // The scene consumes last step's contacts, then physics
                    // produces the next batch.
                    state
                        .scene
                        .tick(&state.input, &mut state.world, &state.contacts);
                    state.contacts.clear();
                    state.world.step(&mut state.contacts);

                    if let Some((x, y)) = state.scene.camera_target(&state.world) {
                        state.camera.follow(x, y);
                    }
                }

                if state.time.steps_this_frame > 0 {
                    state.rebuild_scene_mesh();
                }

                // Render phase reads finalized simulation state from this frame.
                let camera_uniform = state.camera.build_uniform();
                state.gpu.queue.write_buffer(
                    &state.camera_buffer,
                    0,
                    bytemuck::cast_slice(&[camera_uniform]),
                );

                let Some((output, view)) = state.gpu.begin_frame() else {
                    return;
                };

                let overlay_stats = {
                    let (position, velocity) = match state.scene.player_body() {
                        Some(id) => {
                            let body = state.world.body(id);
                            (
                                (body.aabb.center_x, body.aabb.center_y),
                                (body.velocity_x, body.velocity_y),
                            )
                        }
                        None => ((0.0, 0.0), (0.0, 0.0)),
                    };
                    OverlayStats {
                        draw_calls: state.draw_calls.len() as u32,
                        texture_binds: count_texture_binds(&state.draw_calls) as u32,
                        sprite_count: state.sprite_count as u32,
                        player_position: position,
                        player_velocity: velocity,
                        grounded: state.scene.grounded(),
                        current_clip: state.scene.current_clip().unwrap_or("none").to_string(),
                        physics_debug: state.show_physics_debug,
                    }
                };
                let (egui_primitives, egui_textures_delta, overlay_actions) = state
                    .debug_overlay
                    .prepare(&state.window, &state.time, Some(overlay_stats));

                if overlay_actions.toggle_physics_debug {
                    state.show_physics_debug = !state.show_physics_debug;
                    state.rebuild_scene_mesh();
                }

                let screen_descriptor = egui_wgpu::ScreenDescriptor {
                    size_in_pixels: [state.gpu.size.0, state.gpu.size.1],
                    pixels_per_point: state.window.scale_factor() as f32,
                };

                let mut encoder =
                    state
                        .gpu
                        .device
                        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                            label: Some("Render Encoder"),
                        });

                {
                    let clear_color = wgpu::Color {
                        r: 0.392,
                        g: 0.584,
                        b: 0.929,
                        a: 1.0,
                    };
                    let mut last_bound_texture_key: Option<&Arc<str>> = None;
                    let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                        label: Some("Scene Render Pass"),
                        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                            view: &view,
                            resolve_target: None,
                            ops: wgpu::Operations {
                                load: wgpu::LoadOp::Clear(clear_color),
                                store: wgpu::StoreOp::Store,
                            },
                        })],
                        depth_stencil_attachment: None,
                        ..Default::default()
                    });

                    render_pass.set_pipeline(&state.sprite_pipeline.render_pipeline);
                    render_pass.set_bind_group(0, &state.camera_bind_group, &[]);
                    render_pass.set_vertex_buffer(0, state.vertex_buffer.slice(..));
                    render_pass
                        .set_index_buffer(state.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

                    for draw in &state.draw_calls {
                        if let Some(texture) = state.textures.get(&draw.texture_key) {
                            let need_rebind = match last_bound_texture_key {
                                Some(last) => **last != *draw.texture_key,
                                None => true,
                            };
                            if need_rebind {
                                render_pass.set_bind_group(1, &texture.bind_group, &[]);
                                last_bound_texture_key = Some(&draw.texture_key);
                            }
                            render_pass.draw_indexed(
                                draw.index_start..(draw.index_start + draw.index_count),
                                0,
                                0..1,
                            );
                        }
                    }
                }

                state.debug_overlay.upload(
                    &state.gpu.device,
                    &state.gpu.queue,
                    &mut encoder,
                    &egui_primitives,
                    &egui_textures_delta,
                    &screen_descriptor,
                );

                {
                    let mut egui_pass = encoder
                        .begin_render_pass(&wgpu::RenderPassDescriptor {
                            label: Some("egui Render Pass"),
                            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                                view: &view,
                                resolve_target: None,
                                ops: wgpu::Operations {
                                    load: wgpu::LoadOp::Load,
                                    store: wgpu::StoreOp::Store,
                                },
                            })],
                            depth_stencil_attachment: None,
                            ..Default::default()
                        })
                        .forget_lifetime();

                    state
                        .debug_overlay
                        .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
                }

                state.debug_overlay.cleanup(&egui_textures_delta);

                state.gpu.queue.submit(std::iter::once(encoder.finish()));
                output.present();

                // Only clear edge-triggered input (just_pressed / just_released)
                // after at least one fixed step consumed it. Otherwise a press
                // that lands on a frame with 0 simulation steps is silently lost.
                if state.time.steps_this_frame > 0 {
                    state.input.end_frame();
                }
            }

            _ => {}
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn add_quad(
    vertices: &mut Vec<SpriteVertex>,
    indices: &mut Vec<u32>,
    draw_calls: &mut Vec<DrawCall>,
    spec: QuadSpec<'_>,
) {
    let right = spec.left + spec.width;
    let bottom = spec.top + spec.height;
    let [u0, v0, u1, v1] = spec.uv;
    let base_index = vertices.len() as u32;

    // y-down world: `top` is the smaller y and samples the top of the rect.
    vertices.push(SpriteVertex {
        position: [spec.left, spec.top],
        tex_coords: [u0, v0],
        color: spec.color,
    });
    vertices.push(SpriteVertex {
        position: [right, spec.top],
        tex_coords: [u1, v0],
        color: spec.color,
    });
    vertices.push(SpriteVertex {
        position: [right, bottom],
        tex_coords: [u1, v1],
        color: spec.color,
    });
    vertices.push(SpriteVertex {
        position: [spec.left, bottom],
        tex_coords: [u0, v1],
        color: spec.color,
    });

    let draw_start = indices.len() as u32;
    indices.extend_from_slice(&[
        base_index,
        base_index + 1,
        base_index + 2,
        base_index,
        base_index + 2,
        base_index + 3,
    ]);

    push_draw_call(draw_calls, Arc::from(spec.texture_key), draw_start, 6);
}

/// Append a draw call, merging with the previous one when the texture matches
/// and indices are contiguous. Tile quads are emitted in layer order from one
/// sheet, so the whole tilemap collapses into a single `draw_indexed` call.
fn push_draw_call(
    draw_calls: &mut Vec<DrawCall>,
    texture_key: Arc<str>,
    index_start: u32,
    index_count: u32,
) {
    if let Some(last) = draw_calls.last_mut() {
        let contiguous = last.index_start + last.index_count == index_start;
        if *last.texture_key == *texture_key && contiguous {
            last.index_count += index_count;
            return;
        }
    }
    draw_calls.push(DrawCall {
        texture_key,
        index_start,
        index_count,
    });
}

fn load_texture_asset(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pipeline: &SpritePipeline,
    path: &Path,
) -> GpuSpriteTexture {
    let label = path.display().to_string();
    let texture = match std::fs::read(path) {
        Ok(bytes) => match Texture::from_bytes(device, queue, &bytes, &label) {
            Ok(texture) => texture,
            Err(err) => {
                log::warn!("{}. Falling back to placeholder texture.", err);
                placeholder_texture(device, queue, &label)
            }
        },
        Err(err) => {
            log::warn!(
                "Failed to read texture '{}': {}. Falling back to placeholder texture.",
                label,
                err
            );
            placeholder_texture(device, queue, &label)
        }
    };
    let bind_group = pipeline.create_texture_bind_group(device, &texture);
    GpuSpriteTexture {
        texture,
        bind_group,
    }
}

/// Magenta 1x1 stand-in so a missing or corrupt image is loudly visible.
fn placeholder_texture(device: &wgpu::Device, queue: &wgpu::Queue, label: &str) -> Texture {
    Texture::from_rgba8(device, queue, &[255, 0, 255, 255], 1, 1, label)
}

fn count_texture_binds(draw_calls: &[DrawCall]) -> usize {
    let mut binds = 0usize;
    let mut current: Option<&str> = None;
    for draw in draw_calls {
        let key: &str = &draw.texture_key;
        if current != Some(key) {
            current = Some(key);
            binds += 1;
        }
    }
    binds
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::Space => Some(Key::Space),
        KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(Key::Shift),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::F3 => Some(Key::F3),
        KeyCode::F4 => Some(Key::F4),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Menina starting...");

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new();
    event_loop.run_app(&mut app).expect("Event loop error");
}
