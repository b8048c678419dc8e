use cgmath::{InnerSpace, Vector3, Zero};

/**
 * Derive smooth per-vertex normals for a primitive that ships without them.
 *
 * Face normals are accumulated unnormalised, so larger triangles weigh more,
 * then averaged by normalising the sum. Vertices that are not referenced by any
 * non-degenerate triangle get a zero normal. `indices` must already be in range.
 */
pub fn smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut normals = vec![Vector3::<f32>::zero(); positions.len()];

    // A trailing partial triangle is ignored.
    for c in indices.chunks_exact(3) {
        let pos0: Vector3<_> = positions[c[0] as usize].into();
        let pos1: Vector3<_> = positions[c[1] as usize].into();
        let pos2: Vector3<_> = positions[c[2] as usize].into();

        // Counter-clockwise winding points the normal towards the viewer.
        let face = (pos1 - pos0).cross(pos2 - pos0);

        normals[c[0] as usize] += face;
        normals[c[1] as usize] += face;
        normals[c[2] as usize] += face;
    }

    normals
        .into_iter()
        .map(|n| {
            if n.magnitude2() > f32::EPSILON {
                n.normalize().into()
            } else {
                [0.0; 3]
            }
        })
        .collect()
}
