use glam::{Quat, Vec3};
use wgpu::util::DeviceExt;
use bytemuck::{Pod, Zeroable};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.is_empty()
    }

    /// Axis-aligned box centered on the origin, faces wound CCW seen from outside
    pub fn cuboid(size: Vec3, color: [f32; 4]) -> Self {
        let half = size * 0.5;
        // (normal, u, v) with u x v == normal
        let faces = [
            (Vec3::X, Vec3::Y, Vec3::Z),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::Z, Vec3::X),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::Y, Vec3::X),
        ];

        let mut mesh = Mesh::empty();
        for (normal, u, v) in faces {
            let base = mesh.vertices.len() as u32;
            for (a, b) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let corner = (normal + u * a + v * b) * half;
                mesh.vertices.push(Vertex {
                    pos: corner.to_array(),
                    normal: normal.to_array(),
                    color,
                });
            }
            mesh.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }

    /// Horizontal plane in XZ centered on the origin, facing +Y
    pub fn plane(width: f32, depth: f32, color: [f32; 4]) -> Self {
        let (hw, hd) = (width * 0.5, depth * 0.5);
        let vertices = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)]
            .into_iter()
            .map(|(a, b)| Vertex {
                pos: [b * hw, 0.0, a * hd],
                normal: [0.0, 1.0, 0.0],
                color,
            })
            .collect();

        Mesh {
            vertices,
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// Bake a rigid transform into positions and normals
    pub fn transform(&mut self, rotation: Quat, translation: Vec3) {
        for v in self.vertices.iter_mut() {
            v.pos = (rotation * Vec3::from(v.pos) + translation).to_array();
            v.normal = (rotation * Vec3::from(v.normal)).normalize_or_zero().to_array();
        }
    }

    /// Triangles as position triples, in index order
    pub fn triangles(&self) -> Vec<[Vec3; 3]> {
        self.indices
            .chunks_exact(3)
            .map(|tri| {
                [
                    Vec3::from(self.vertices[tri[0] as usize].pos),
                    Vec3::from(self.vertices[tri[1] as usize].pos),
                    Vec3::from(self.vertices[tri[2] as usize].pos),
                ]
            })
            .collect()
    }

    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(tri: &[Vec3; 3]) -> Vec3 {
        (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalize()
    }

    #[test]
    fn test_cuboid_faces_point_outward() {
        let mesh = Mesh::cuboid(Vec3::new(2.0, 4.0, 6.0), [1.0; 4]);
        assert_eq!(mesh.vertices.len(), 24);
        assert_eq!(mesh.indices.len(), 36);

        for tri in mesh.triangles() {
            let centroid = (tri[0] + tri[1] + tri[2]) / 3.0;
            assert!(face_normal(&tri).dot(centroid) > 0.0, "triangle {tri:?} faces inward");
        }
    }

    #[test]
    fn test_cuboid_extents() {
        let mesh = Mesh::cuboid(Vec3::new(2.0, 4.0, 6.0), [1.0; 4]);
        let max = mesh
            .vertices
            .iter()
            .fold(Vec3::splat(f32::MIN), |acc, v| acc.max(Vec3::from(v.pos)));
        assert_eq!(max, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_plane_faces_up() {
        let mesh = Mesh::plane(10.0, 4.0, [1.0; 4]);
        for tri in mesh.triangles() {
            assert!((face_normal(&tri) - Vec3::Y).length() < 1e-6);
        }
    }

    #[test]
    fn test_transform_moves_and_rotates() {
        let mut mesh = Mesh::plane(2.0, 2.0, [1.0; 4]);
        mesh.transform(Quat::from_rotation_x(std::f32::consts::FRAC_PI_2), Vec3::new(0.0, 5.0, 0.0));
        for v in &mesh.vertices {
            assert!((v.pos[1] - 5.0).abs() <= 1.0 + 1e-5);
            assert!((Vec3::from(v.normal) - Vec3::Z).length() < 1e-5);
        }
    }
}
