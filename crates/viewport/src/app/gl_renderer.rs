use std::collections::HashMap;

use glam::{Mat4, Vec3};
use glow::HasContext;

use vcad_viewport_lib::camera::CameraPose;
use vcad_viewport_lib::grouping::PointDetail;
use vcad_viewport_lib::material::MaterialId;
use vcad_viewport_lib::mesh::primitives::unit_sphere;
use vcad_viewport_lib::render::{InstanceDraw, LineDraw, MeshDraw, RenderSnapshot};
use vcad_viewport_lib::scene::Light;

// ── Render parameters ────────────────────────────────────────

/// Parameters for rendering the viewport
pub struct RenderParams {
    /// Viewport rectangle [x, y, width, height] in pixels
    pub viewport: [f32; 4],
    /// Background color RGB
    pub bg_color: [f32; 3],
}

// ── GPU handles ──────────────────────────────────────────────

struct GpuMesh {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ibo: glow::Buffer,
    index_count: i32,
    material_id: MaterialId,
    z_offset: f32,
    casts_shadow: bool,
}

struct GpuLines {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    vertex_count: i32,
    material_id: MaterialId,
    width: f32,
}

struct GpuInstances {
    vao: glow::VertexArray,
    offsets: glow::Buffer,
    count: i32,
    material_id: MaterialId,
    radius: f32,
    detail: PointDetail,
}

/// Sphere geometry shared by every instanced batch of one detail level
struct GpuSphere {
    vbo: glow::Buffer,
    ibo: glow::Buffer,
    index_count: i32,
}

struct ShadowMap {
    fbo: glow::Framebuffer,
    depth: glow::Texture,
    size: i32,
}

// ── Main GL renderer ─────────────────────────────────────────

pub struct GlRenderer {
    mesh_program: glow::Program,
    line_program: glow::Program,
    instance_program: glow::Program,
    depth_program: glow::Program,
    meshes: Vec<GpuMesh>,
    lines: Vec<GpuLines>,
    instances: Vec<GpuInstances>,
    spheres: HashMap<PointDetail, GpuSphere>,
    /// Colour per live material; entries go away when the cache disposes them
    colors: HashMap<MaterialId, [f32; 4]>,
    lights: Vec<Light>,
    shadow: Option<ShadowMap>,
    /// Version counter to detect scene changes
    last_scene_version: Option<u64>,
}

impl GlRenderer {
    pub fn new(gl: &glow::Context) -> Result<Self, String> {
        let mesh_program = compile_program(gl, MESH_VERT, MESH_FRAG)?;
        let line_program = compile_program(gl, LINE_VERT, LINE_FRAG)?;
        let instance_program = compile_program(gl, INSTANCE_VERT, MESH_FRAG)?;
        let depth_program = compile_program(gl, DEPTH_VERT, DEPTH_FRAG)?;

        let mut spheres = HashMap::new();
        for detail in [PointDetail::High, PointDetail::Low] {
            let (rings, sectors) = detail.sphere_segments();
            let sphere = unit_sphere(rings, sectors);
            spheres.insert(detail, upload_sphere(gl, &sphere.positions, &sphere.normals, &sphere.indices)?);
        }

        Ok(Self {
            mesh_program,
            line_program,
            instance_program,
            depth_program,
            meshes: Vec::new(),
            lines: Vec::new(),
            instances: Vec::new(),
            spheres,
            colors: HashMap::new(),
            lights: Vec::new(),
            shadow: None,
            last_scene_version: None,
        })
    }

    /// Re-upload the scene when the snapshot version moved
    pub fn sync_snapshot(&mut self, gl: &glow::Context, snapshot: &RenderSnapshot) {
        if self.last_scene_version == Some(snapshot.version) {
            return;
        }
        self.last_scene_version = Some(snapshot.version);
        self.clear_scene(gl);

        for draw in &snapshot.meshes {
            self.colors.insert(draw.material_id, draw.color);
            match upload_mesh(gl, draw) {
                Ok(mesh) => self.meshes.push(mesh),
                Err(e) => tracing::error!("mesh upload failed for {}: {e}", draw.key),
            }
        }
        for draw in &snapshot.lines {
            self.colors.insert(draw.material_id, draw.color);
            match upload_lines(gl, draw) {
                Ok(lines) => self.lines.push(lines),
                Err(e) => tracing::error!("line upload failed for {}: {e}", draw.key),
            }
        }
        for draw in &snapshot.instances {
            self.colors.insert(draw.material_id, draw.color);
            let Some(sphere) = self.spheres.get(&draw.detail) else {
                continue;
            };
            match upload_instances(gl, sphere, draw) {
                Ok(batch) => self.instances.push(batch),
                Err(e) => tracing::error!("instance upload failed for {}: {e}", draw.key),
            }
        }

        self.lights = snapshot.lights.clone();
        let shadow_size = self.lights.iter().find_map(|l| match l {
            Light::Directional { casts_shadow: true, shadow_map_size, .. } => Some(*shadow_map_size as i32),
            _ => None,
        });
        self.ensure_shadow_map(gl, shadow_size);
    }

    /// Forget colours of materials the cache has disposed
    pub fn release_materials(&mut self, disposed: &[MaterialId]) {
        for id in disposed {
            self.colors.remove(id);
        }
    }

    fn ensure_shadow_map(&mut self, gl: &glow::Context, size: Option<i32>) {
        if self.shadow.as_ref().map(|s| s.size) == size {
            return;
        }
        if let Some(old) = self.shadow.take() {
            unsafe {
                gl.delete_framebuffer(old.fbo);
                gl.delete_texture(old.depth);
            }
        }
        if let Some(size) = size {
            match create_shadow_map(gl, size) {
                Ok(map) => self.shadow = Some(map),
                Err(e) => tracing::warn!("shadows disabled: {e}"),
            }
        }
    }

    fn clear_scene(&mut self, gl: &glow::Context) {
        unsafe {
            for mesh in self.meshes.drain(..) {
                gl.delete_vertex_array(mesh.vao);
                gl.delete_buffer(mesh.vbo);
                gl.delete_buffer(mesh.ibo);
            }
            for lines in self.lines.drain(..) {
                gl.delete_vertex_array(lines.vao);
                gl.delete_buffer(lines.vbo);
            }
            for batch in self.instances.drain(..) {
                gl.delete_vertex_array(batch.vao);
                gl.delete_buffer(batch.offsets);
            }
        }
    }

    fn color(&self, id: MaterialId) -> [f32; 4] {
        self.colors.get(&id).copied().unwrap_or([1.0, 0.0, 0.0, 1.0])
    }

    /// Render the scene. `target` is the framebuffer egui is drawing into.
    pub fn paint(&self, gl: &glow::Context, pose: &CameraPose, params: &RenderParams, target: Option<glow::Framebuffer>) {
        let vp = pose.view_projection();
        let light_vp = self.shadow_pass(gl, target);

        unsafe {
            gl.viewport(
                params.viewport[0] as i32,
                params.viewport[1] as i32,
                params.viewport[2] as i32,
                params.viewport[3] as i32,
            );
            gl.scissor(
                params.viewport[0] as i32,
                params.viewport[1] as i32,
                params.viewport[2] as i32,
                params.viewport[3] as i32,
            );
            gl.enable(glow::SCISSOR_TEST);

            gl.clear_color(params.bg_color[0], params.bg_color[1], params.bg_color[2], 1.0);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);

            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LEQUAL);
            gl.enable(glow::BLEND);
            gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);

            // Meshes, opaque first as ordered by the snapshot
            gl.use_program(Some(self.mesh_program));
            set_uniform_mat4(gl, self.mesh_program, "u_mvp", &vp);
            self.set_lighting(gl, self.mesh_program, light_vp);
            for mesh in &self.meshes {
                let color = self.color(mesh.material_id);
                set_uniform_vec4(gl, self.mesh_program, "u_color", color);
                if mesh.z_offset != 0.0 {
                    gl.enable(glow::POLYGON_OFFSET_FILL);
                    gl.polygon_offset(mesh.z_offset, mesh.z_offset);
                }
                gl.depth_mask(color[3] >= 1.0);
                draw_mesh(gl, mesh);
                gl.depth_mask(true);
                gl.disable(glow::POLYGON_OFFSET_FILL);
            }

            // Instanced point spheres
            gl.use_program(Some(self.instance_program));
            set_uniform_mat4(gl, self.instance_program, "u_mvp", &vp);
            self.set_lighting(gl, self.instance_program, light_vp);
            for batch in &self.instances {
                set_uniform_vec4(gl, self.instance_program, "u_color", self.color(batch.material_id));
                set_uniform_f32(gl, self.instance_program, "u_radius", batch.radius);
                if let Some(sphere) = self.spheres.get(&batch.detail) {
                    draw_instances(gl, batch, sphere);
                }
            }

            // Lines
            gl.use_program(Some(self.line_program));
            set_uniform_mat4(gl, self.line_program, "u_mvp", &vp);
            for lines in &self.lines {
                set_uniform_vec4(gl, self.line_program, "u_color", self.color(lines.material_id));
                gl.line_width(lines.width.max(1.0));
                draw_lines(gl, lines);
            }
            gl.line_width(1.0);

            gl.disable(glow::BLEND);
            gl.disable(glow::DEPTH_TEST);
            gl.disable(glow::SCISSOR_TEST);
            gl.use_program(None);
        }
    }

    /// Render shadow casters into the depth map; returns the light matrix
    fn shadow_pass(&self, gl: &glow::Context, target: Option<glow::Framebuffer>) -> Option<Mat4> {
        let shadow = self.shadow.as_ref()?;
        let (position, extent) = self.lights.iter().find_map(|l| match l {
            Light::Directional { casts_shadow: true, position, shadow_extent, .. } => Some((*position, *shadow_extent)),
            _ => None,
        })?;

        let eye = position.normalize_or(Vec3::Y) * extent * 2.0;
        let up = if eye.cross(Vec3::Y).length_squared() < 1e-6 { Vec3::Z } else { Vec3::Y };
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, up);
        let proj = Mat4::orthographic_rh_gl(-extent, extent, -extent, extent, 0.1, extent * 4.0);
        let light_vp = proj * view;

        unsafe {
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(shadow.fbo));
            gl.viewport(0, 0, shadow.size, shadow.size);
            gl.disable(glow::SCISSOR_TEST);
            gl.clear(glow::DEPTH_BUFFER_BIT);
            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LESS);

            gl.use_program(Some(self.depth_program));
            set_uniform_mat4(gl, self.depth_program, "u_light_vp", &light_vp);
            for mesh in self.meshes.iter().filter(|m| m.casts_shadow) {
                draw_mesh(gl, mesh);
            }

            gl.bind_framebuffer(glow::FRAMEBUFFER, target);
        }
        Some(light_vp)
    }

    fn set_lighting(&self, gl: &glow::Context, program: glow::Program, light_vp: Option<Mat4>) {
        let mut sky = Vec3::ONE;
        let mut ground = Vec3::splat(0.3);
        let mut hemi = 0.0;
        let mut dir_color = Vec3::ONE;
        let mut dir_intensity = 0.0;
        let mut dir = Vec3::new(0.5, 1.0, 0.7).normalize();

        for light in &self.lights {
            match light {
                Light::Hemisphere { sky_color, ground_color, intensity } => {
                    sky = Vec3::from(*sky_color);
                    ground = Vec3::from(*ground_color);
                    hemi = *intensity;
                }
                Light::Directional { color, intensity, position, .. } => {
                    dir_color = Vec3::from(*color);
                    dir_intensity = *intensity;
                    dir = position.normalize_or(Vec3::Y);
                }
            }
        }
        if self.lights.is_empty() {
            hemi = 1.0;
        }

        set_uniform_vec3(gl, program, "u_sky_color", &(sky * hemi));
        set_uniform_vec3(gl, program, "u_ground_color", &(ground * hemi));
        set_uniform_vec3(gl, program, "u_light_color", &(dir_color * dir_intensity));
        set_uniform_vec3(gl, program, "u_light_dir", &dir);

        unsafe {
            match (light_vp, &self.shadow) {
                (Some(light_vp), Some(shadow)) => {
                    set_uniform_mat4(gl, program, "u_light_vp", &light_vp);
                    gl.active_texture(glow::TEXTURE0);
                    gl.bind_texture(glow::TEXTURE_2D, Some(shadow.depth));
                    let loc = gl.get_uniform_location(program, "u_shadow_map");
                    gl.uniform_1_i32(loc.as_ref(), 0);
                    set_uniform_f32(gl, program, "u_shadows", 1.0);
                }
                _ => set_uniform_f32(gl, program, "u_shadows", 0.0),
            }
        }
    }

    pub fn destroy(&mut self, gl: &glow::Context) {
        self.clear_scene(gl);
        unsafe {
            gl.delete_program(self.mesh_program);
            gl.delete_program(self.line_program);
            gl.delete_program(self.instance_program);
            gl.delete_program(self.depth_program);
            for (_, sphere) in self.spheres.drain() {
                gl.delete_buffer(sphere.vbo);
                gl.delete_buffer(sphere.ibo);
            }
            if let Some(shadow) = self.shadow.take() {
                gl.delete_framebuffer(shadow.fbo);
                gl.delete_texture(shadow.depth);
            }
        }
        self.colors.clear();
    }
}

// ── GPU upload ───────────────────────────────────────────────

fn upload_mesh(gl: &glow::Context, draw: &MeshDraw) -> Result<GpuMesh, String> {
    let mut vertices = Vec::with_capacity(draw.positions.len() * 2);
    for (p, n) in draw.positions.chunks_exact(3).zip(draw.normals.chunks_exact(3)) {
        vertices.extend_from_slice(p);
        vertices.extend_from_slice(n);
    }

    unsafe {
        let vao = gl.create_vertex_array()?;
        gl.bind_vertex_array(Some(vao));

        let vbo = gl.create_buffer()?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytemuck_cast_slice(&vertices), glow::STATIC_DRAW);

        let stride = 6 * 4; // 6 floats * 4 bytes
        // position: location 0
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
        // normal: location 1
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, stride, 3 * 4);

        let ibo = gl.create_buffer()?;
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
        gl.buffer_data_u8_slice(glow::ELEMENT_ARRAY_BUFFER, bytemuck_cast_slice(&draw.indices), glow::STATIC_DRAW);

        gl.bind_vertex_array(None);

        Ok(GpuMesh {
            vao,
            vbo,
            ibo,
            index_count: draw.indices.len() as i32,
            material_id: draw.material_id,
            z_offset: draw.z_offset,
            casts_shadow: draw.casts_shadow,
        })
    }
}

fn upload_lines(gl: &glow::Context, draw: &LineDraw) -> Result<GpuLines, String> {
    unsafe {
        let vao = gl.create_vertex_array()?;
        gl.bind_vertex_array(Some(vao));

        let vbo = gl.create_buffer()?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytemuck_cast_slice(&draw.vertices), glow::STATIC_DRAW);

        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, 3 * 4, 0);

        gl.bind_vertex_array(None);

        Ok(GpuLines {
            vao,
            vbo,
            vertex_count: (draw.vertices.len() / 3) as i32,
            material_id: draw.material_id,
            width: draw.width,
        })
    }
}

fn upload_sphere(gl: &glow::Context, positions: &[f32], normals: &[f32], indices: &[u32]) -> Result<GpuSphere, String> {
    let mut vertices = Vec::with_capacity(positions.len() * 2);
    for (p, n) in positions.chunks_exact(3).zip(normals.chunks_exact(3)) {
        vertices.extend_from_slice(p);
        vertices.extend_from_slice(n);
    }
    unsafe {
        let vbo = gl.create_buffer()?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytemuck_cast_slice(&vertices), glow::STATIC_DRAW);
        let ibo = gl.create_buffer()?;
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
        gl.buffer_data_u8_slice(glow::ELEMENT_ARRAY_BUFFER, bytemuck_cast_slice(indices), glow::STATIC_DRAW);
        gl.bind_buffer(glow::ARRAY_BUFFER, None);
        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, None);
        Ok(GpuSphere {
            vbo,
            ibo,
            index_count: indices.len() as i32,
        })
    }
}

/// One VAO per batch: shared sphere geometry plus a per-instance offset stream
fn upload_instances(gl: &glow::Context, sphere: &GpuSphere, draw: &InstanceDraw) -> Result<GpuInstances, String> {
    unsafe {
        let vao = gl.create_vertex_array()?;
        gl.bind_vertex_array(Some(vao));

        gl.bind_buffer(glow::ARRAY_BUFFER, Some(sphere.vbo));
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, 6 * 4, 0);
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, 6 * 4, 3 * 4);

        let offsets = gl.create_buffer()?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(offsets));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, bytemuck_cast_slice(&draw.offsets), glow::STATIC_DRAW);
        // instance offset: location 2
        gl.enable_vertex_attrib_array(2);
        gl.vertex_attrib_pointer_f32(2, 3, glow::FLOAT, false, 3 * 4, 0);
        gl.vertex_attrib_divisor(2, 1);

        gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(sphere.ibo));
        gl.bind_vertex_array(None);

        Ok(GpuInstances {
            vao,
            offsets,
            count: (draw.offsets.len() / 3) as i32,
            material_id: draw.material_id,
            radius: draw.radius,
            detail: draw.detail,
        })
    }
}

fn create_shadow_map(gl: &glow::Context, size: i32) -> Result<ShadowMap, String> {
    unsafe {
        let depth = gl.create_texture()?;
        gl.bind_texture(glow::TEXTURE_2D, Some(depth));
        gl.tex_image_2d(
            glow::TEXTURE_2D,
            0,
            glow::DEPTH_COMPONENT24 as i32,
            size,
            size,
            0,
            glow::DEPTH_COMPONENT,
            glow::FLOAT,
            glow::PixelUnpackData::Slice(None),
        );
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
        gl.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);

        let fbo = gl.create_framebuffer()?;
        gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
        gl.framebuffer_texture_2d(glow::FRAMEBUFFER, glow::DEPTH_ATTACHMENT, glow::TEXTURE_2D, Some(depth), 0);
        gl.draw_buffer(glow::NONE);
        gl.read_buffer(glow::NONE);
        let complete = gl.check_framebuffer_status(glow::FRAMEBUFFER) == glow::FRAMEBUFFER_COMPLETE;
        gl.bind_framebuffer(glow::FRAMEBUFFER, None);
        gl.bind_texture(glow::TEXTURE_2D, None);

        if !complete {
            gl.delete_framebuffer(fbo);
            gl.delete_texture(depth);
            return Err("incomplete shadow framebuffer".to_string());
        }
        Ok(ShadowMap { fbo, depth, size })
    }
}

// ── Draw calls ───────────────────────────────────────────────

unsafe fn draw_mesh(gl: &glow::Context, mesh: &GpuMesh) {
    gl.bind_vertex_array(Some(mesh.vao));
    gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(mesh.ibo));
    gl.draw_elements(glow::TRIANGLES, mesh.index_count, glow::UNSIGNED_INT, 0);
    gl.bind_vertex_array(None);
}

unsafe fn draw_lines(gl: &glow::Context, lines: &GpuLines) {
    gl.bind_vertex_array(Some(lines.vao));
    gl.draw_arrays(glow::LINES, 0, lines.vertex_count);
    gl.bind_vertex_array(None);
}

unsafe fn draw_instances(gl: &glow::Context, batch: &GpuInstances, sphere: &GpuSphere) {
    gl.bind_vertex_array(Some(batch.vao));
    gl.draw_elements_instanced(glow::TRIANGLES, sphere.index_count, glow::UNSIGNED_INT, 0, batch.count);
    gl.bind_vertex_array(None);
}

// ── Shader compilation ───────────────────────────────────────

fn compile_program(gl: &glow::Context, vert_src: &str, frag_src: &str) -> Result<glow::Program, String> {
    unsafe {
        let program = gl.create_program()?;

        let vert = gl.create_shader(glow::VERTEX_SHADER)?;
        gl.shader_source(vert, vert_src);
        gl.compile_shader(vert);
        if !gl.get_shader_compile_status(vert) {
            let log = gl.get_shader_info_log(vert);
            tracing::error!("Vertex shader error: {log}");
        }

        let frag = gl.create_shader(glow::FRAGMENT_SHADER)?;
        gl.shader_source(frag, frag_src);
        gl.compile_shader(frag);
        if !gl.get_shader_compile_status(frag) {
            let log = gl.get_shader_info_log(frag);
            tracing::error!("Fragment shader error: {log}");
        }

        gl.attach_shader(program, vert);
        gl.attach_shader(program, frag);
        gl.link_program(program);
        let linked = gl.get_program_link_status(program);
        if !linked {
            let log = gl.get_program_info_log(program);
            tracing::error!("Program link error: {log}");
        }

        gl.delete_shader(vert);
        gl.delete_shader(frag);

        if linked {
            Ok(program)
        } else {
            gl.delete_program(program);
            Err("shader program failed to link".to_string())
        }
    }
}

// ── Uniform setters ──────────────────────────────────────────

fn set_uniform_mat4(gl: &glow::Context, program: glow::Program, name: &str, mat: &Mat4) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_matrix_4_f32_slice(loc.as_ref(), false, &mat.to_cols_array());
    }
}

fn set_uniform_vec3(gl: &glow::Context, program: glow::Program, name: &str, v: &Vec3) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_3_f32(loc.as_ref(), v.x, v.y, v.z);
    }
}

fn set_uniform_vec4(gl: &glow::Context, program: glow::Program, name: &str, v: [f32; 4]) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_4_f32(loc.as_ref(), v[0], v[1], v[2], v[3]);
    }
}

fn set_uniform_f32(gl: &glow::Context, program: glow::Program, name: &str, v: f32) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_1_f32(loc.as_ref(), v);
    }
}

// ── Byte cast helper ─────────────────────────────────────────

fn bytemuck_cast_slice<T: Copy>(slice: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(slice.as_ptr() as *const u8, std::mem::size_of_val(slice)) }
}

// ── Shaders ──────────────────────────────────────────────────

const MESH_VERT: &str = r#"#version 330 core
uniform mat4 u_mvp;
uniform mat4 u_light_vp;

layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;

out vec3 v_normal;
out vec4 v_light_pos;

void main() {
    gl_Position = u_mvp * vec4(a_position, 1.0);
    v_normal = a_normal;
    v_light_pos = u_light_vp * vec4(a_position, 1.0);
}
"#;

const INSTANCE_VERT: &str = r#"#version 330 core
uniform mat4 u_mvp;
uniform mat4 u_light_vp;
uniform float u_radius;

layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;
layout(location = 2) in vec3 a_offset;

out vec3 v_normal;
out vec4 v_light_pos;

void main() {
    vec3 world = a_position * u_radius + a_offset;
    gl_Position = u_mvp * vec4(world, 1.0);
    v_normal = a_normal;
    v_light_pos = u_light_vp * vec4(world, 1.0);
}
"#;

const MESH_FRAG: &str = r#"#version 330 core
uniform vec4 u_color;
uniform vec3 u_sky_color;
uniform vec3 u_ground_color;
uniform vec3 u_light_color;
uniform vec3 u_light_dir;
uniform float u_shadows;
uniform sampler2D u_shadow_map;

in vec3 v_normal;
in vec4 v_light_pos;

out vec4 frag_color;

float shadow_factor() {
    if (u_shadows < 0.5) {
        return 1.0;
    }
    vec3 p = v_light_pos.xyz / v_light_pos.w * 0.5 + 0.5;
    if (p.x < 0.0 || p.x > 1.0 || p.y < 0.0 || p.y > 1.0 || p.z > 1.0) {
        return 1.0;
    }
    float closest = texture(u_shadow_map, p.xy).r;
    return p.z - 0.002 > closest ? 0.4 : 1.0;
}

void main() {
    vec3 n = normalize(v_normal);
    vec3 hemi = mix(u_ground_color, u_sky_color, n.y * 0.5 + 0.5);
    float diffuse = max(dot(n, u_light_dir), 0.0);
    vec3 light = hemi + u_light_color * diffuse * shadow_factor();
    frag_color = vec4(u_color.rgb * light, u_color.a);
}
"#;

const LINE_VERT: &str = r#"#version 330 core
uniform mat4 u_mvp;

layout(location = 0) in vec3 a_position;

void main() {
    gl_Position = u_mvp * vec4(a_position, 1.0);
}
"#;

const LINE_FRAG: &str = r#"#version 330 core
uniform vec4 u_color;
out vec4 frag_color;

void main() {
    frag_color = u_color;
}
"#;

const DEPTH_VERT: &str = r#"#version 330 core
uniform mat4 u_light_vp;

layout(location = 0) in vec3 a_position;

void main() {
    gl_Position = u_light_vp * vec4(a_position, 1.0);
}
"#;

const DEPTH_FRAG: &str = r#"#version 330 core
void main() {}
"#;
