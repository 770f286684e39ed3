pub struct TestModel {
    pub bytes: &'static [u8],
    pub vertices: usize,
    pub triangles: usize,
    pub groups: usize,
}

/// Two triangles sharing an edge, each in its own material group. Ends right
/// after a zero sub-version.
pub const MS3D_QUAD: TestModel = TestModel {
    bytes: include_bytes!("../../../res/quad/quad.ms3d"),
    vertices: 4,
    triangles: 2,
    groups: 2,
};

/// The quad in one group, bound to a joint, with comments and all three
/// extension sections.
pub const MS3D_SKINNED: TestModel = TestModel {
    bytes: include_bytes!("../../../res/skinned/skinned.ms3d"),
    vertices: 4,
    triangles: 2,
    groups: 1,
};

/// `MS3D_QUAD` as written by the text encoder.
pub const TXT_QUAD: &str = include_str!("../../../res/quad/quad.txt");

/// A hand edited text model exercising comments, blank lines and tabs.
pub const TXT_QUAD_COMMENTED: &str = include_str!("../../../res/quad/quad-commented.txt");
