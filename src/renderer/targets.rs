use wgpu::{
    Device, Extent3d, TextureDescriptor, TextureDimension, TextureFormat, TextureUsages,
    TextureView, TextureViewDescriptor,
};

/// Color format of the offscreen scene pass. Float so the tone mapping
/// toggle has something above 1.0 to compress.
pub const HDR_FORMAT: TextureFormat = TextureFormat::Rgba16Float;
pub const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth24PlusStencil8;

/// Highest count from {8, 4, 2} not above `requested` that `supported`
/// accepts, else 1.
pub fn choose_sample_count(requested: u32, supported: impl Fn(u32) -> bool) -> u32 {
    [8, 4, 2]
        .into_iter()
        .filter(|&n| n <= requested)
        .find(|&n| supported(n))
        .unwrap_or(1)
}

/// Multisampled color and depth plus the single-sample texture they resolve into.
pub struct OffscreenTargets {
    pub sample_count: u32,
    msaa_view: Option<TextureView>,
    pub resolve_view: TextureView,
    pub depth_view: TextureView,
}

impl OffscreenTargets {
    pub fn new(device: &Device, width: u32, height: u32, sample_count: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let size = Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let create = |label: &str, format, samples, usage| {
            device
                .create_texture(&TextureDescriptor {
                    label: Some(label),
                    size,
                    mip_level_count: 1,
                    sample_count: samples,
                    dimension: TextureDimension::D2,
                    format,
                    usage,
                    view_formats: &[],
                })
                .create_view(&TextureViewDescriptor::default())
        };
        let msaa_view = (sample_count > 1).then(|| {
            create(
                "msaa color",
                HDR_FORMAT,
                sample_count,
                TextureUsages::RENDER_ATTACHMENT,
            )
        });
        let resolve_view = create(
            "resolved color",
            HDR_FORMAT,
            1,
            TextureUsages::RENDER_ATTACHMENT | TextureUsages::TEXTURE_BINDING,
        );
        let depth_view = create(
            "msaa depth",
            DEPTH_FORMAT,
            sample_count,
            TextureUsages::RENDER_ATTACHMENT,
        );
        Self {
            sample_count,
            msaa_view,
            resolve_view,
            depth_view,
        }
    }

    /// Attachment to draw into and the texture it resolves to, if any.
    pub fn color_attachment(&self) -> (&TextureView, Option<&TextureView>) {
        match &self.msaa_view {
            Some(msaa) => (msaa, Some(&self.resolve_view)),
            None => (&self.resolve_view, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_requested_count_when_supported() {
        assert_eq!(choose_sample_count(4, |_| true), 4);
        assert_eq!(choose_sample_count(16, |_| true), 8);
    }

    #[test]
    fn falls_back_to_lower_counts() {
        assert_eq!(choose_sample_count(8, |n| n <= 4), 4);
        assert_eq!(choose_sample_count(4, |n| n == 2), 2);
        assert_eq!(choose_sample_count(4, |_| false), 1);
        assert_eq!(choose_sample_count(1, |_| true), 1);
        assert_eq!(choose_sample_count(3, |_| true), 2);
    }
}
