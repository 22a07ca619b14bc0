/// In-memory frame: interleaved BGR bytes, 3 per pixel, row-major. Owned by
/// a single pipeline invocation and never shared across requests.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Frame {
    pub(crate) data: Vec<u8>,
    pub(crate) width: u32,
    pub(crate) height: u32,
}
