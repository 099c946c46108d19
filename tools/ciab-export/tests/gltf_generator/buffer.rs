//! Binary buffer and accessor packing, plus the GLB container.

use gltf_json as json;
use json::accessor::{ComponentType, GenericComponentType, Type};
use json::validation::Checked::Valid;

/// Accumulates one binary buffer plus the views and accessors into it
#[derive(Default)]
pub(crate) struct BufferBuilder {
    pub data: Vec<u8>,
    pub views: Vec<json::buffer::View>,
    pub accessors: Vec<json::Accessor>,
}

impl BufferBuilder {
    /// f32 vertex attribute; positions also need bounds
    pub fn vertex_f32<const N: usize>(
        &mut self,
        values: &[[f32; N]],
        type_: Type,
        with_bounds: bool,
    ) -> json::Index<json::Accessor> {
        let bounds = with_bounds.then(|| bounds(values));
        self.push(
            bytemuck::cast_slice(values.as_flattened()),
            values.len(),
            ComponentType::F32,
            type_,
            Some(json::buffer::Target::ArrayBuffer),
            bounds,
        )
    }

    pub fn joints(&mut self, values: &[[u16; 4]]) -> json::Index<json::Accessor> {
        self.push(
            bytemuck::cast_slice(values.as_flattened()),
            values.len(),
            ComponentType::U16,
            Type::Vec4,
            Some(json::buffer::Target::ArrayBuffer),
            None,
        )
    }

    pub fn indices(&mut self, values: &[u32]) -> json::Index<json::Accessor> {
        self.push(
            bytemuck::cast_slice(values),
            values.len(),
            ComponentType::U32,
            Type::Scalar,
            Some(json::buffer::Target::ElementArrayBuffer),
            None,
        )
    }

    /// Non-vertex f32 data (inverse bind matrices, animation samples)
    pub fn data_f32<const N: usize>(
        &mut self,
        values: &[[f32; N]],
        type_: Type,
        with_bounds: bool,
    ) -> json::Index<json::Accessor> {
        let bounds = with_bounds.then(|| bounds(values));
        self.push(
            bytemuck::cast_slice(values.as_flattened()),
            values.len(),
            ComponentType::F32,
            type_,
            None,
            bounds,
        )
    }

    fn push(
        &mut self,
        bytes: &[u8],
        count: usize,
        component: ComponentType,
        type_: Type,
        target: Option<json::buffer::Target>,
        bounds: Option<(Vec<f32>, Vec<f32>)>,
    ) -> json::Index<json::Accessor> {
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);
        while !self.data.len().is_multiple_of(4) {
            self.data.push(0);
        }

        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: bytes.len().into(),
            byte_offset: Some(offset.into()),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: target.map(Valid),
        });

        let to_value =
            |v: Vec<f32>| json::Value::Array(v.into_iter().map(json::Value::from).collect());
        let (min, max) = match bounds {
            Some((min, max)) => (Some(to_value(min)), Some(to_value(max))),
            None => (None, None),
        };

        self.accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(self.views.len() as u32 - 1)),
            byte_offset: Some(0u64.into()),
            count: count.into(),
            component_type: Valid(GenericComponentType(component)),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(type_),
            min,
            max,
            name: None,
            normalized: false,
            sparse: None,
        });
        json::Index::new(self.accessors.len() as u32 - 1)
    }
}

impl BufferBuilder {
    /// Finish the scene as a GLB: 12-byte header, JSON chunk, BIN chunk
    pub fn into_glb(self, mut root: json::Root) -> Vec<u8> {
        root.accessors = self.accessors;
        root.buffer_views = self.views;
        root.buffers = vec![json::Buffer {
            byte_length: self.data.len().into(),
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            uri: None,
        }];
        let json = json::serialize::to_vec(&root).expect("Failed to serialize glTF JSON");

        let mut body = Vec::new();
        write_chunk(&mut body, b"JSON", &json, b' ');
        write_chunk(&mut body, b"BIN\0", &self.data, 0);

        let mut glb = Vec::with_capacity(12 + body.len());
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(12 + body.len() as u32).to_le_bytes());
        glb.extend_from_slice(&body);
        glb
    }
}

/// Length-prefixed chunk, padded to 4 bytes with `pad`
fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], payload: &[u8], pad: u8) {
    let padded = payload.len().next_multiple_of(4);
    out.extend_from_slice(&(padded as u32).to_le_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(payload);
    out.resize(out.len() + padded - payload.len(), pad);
}

fn bounds<const N: usize>(values: &[[f32; N]]) -> (Vec<f32>, Vec<f32>) {
    let mut min = vec![f32::MAX; N];
    let mut max = vec![f32::MIN; N];
    for value in values {
        for k in 0..N {
            min[k] = min[k].min(value[k]);
            max[k] = max[k].max(value[k]);
        }
    }
    (min, max)
}
