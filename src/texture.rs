use image::{imageops::FilterType, DynamicImage, RgbaImage};
use std::path::Path;
use wgpu::{
    AddressMode, Device, Extent3d, FilterMode, ImageCopyTexture, ImageDataLayout, Origin3d, Queue,
    Sampler, SamplerDescriptor, TextureAspect, TextureDescriptor, TextureDimension, TextureFormat,
    TextureUsages, TextureView, TextureViewDescriptor,
};

/// How a texture's texels are interpreted by the shaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureRole {
    /// Diffuse colour, decoded from sRGB when sampled.
    Color,
    /// Specular intensity, sampled as stored.
    Intensity,
}

impl TextureRole {
    pub fn format(self) -> TextureFormat {
        match self {
            TextureRole::Color => TextureFormat::Rgba8UnormSrgb,
            TextureRole::Intensity => TextureFormat::Rgba8Unorm,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    /// Used for images with alpha so cut-outs don't bleed at the borders.
    ClampToEdge,
}

/// Decoded texture with its full mip chain, level 0 first.
pub struct TextureImage {
    pub mips: Vec<RgbaImage>,
    pub wrap: WrapMode,
}

impl TextureImage {
    /// Decodes `path`. Unreadable files are logged and replaced by a white texel
    /// so a missing map never stops the viewer.
    pub fn load(path: &Path) -> Self {
        match image::open(path) {
            Ok(img) => {
                log::debug!("loaded texture {} ({}x{})", path.display(), img.width(), img.height());
                Self::from_image(img)
            }
            Err(e) => {
                log::warn!("texture failed to load at {}: {e}", path.display());
                Self::white()
            }
        }
    }

    /// Rows are flipped so that v = 0 addresses the bottom of the picture,
    /// matching the texture coordinates stored in OBJ files.
    pub fn from_image(img: DynamicImage) -> Self {
        let wrap = if img.color().has_alpha() {
            WrapMode::ClampToEdge
        } else {
            WrapMode::Repeat
        };
        let base = img.flipv().to_rgba8();
        Self {
            mips: mip_chain(base),
            wrap,
        }
    }

    pub fn white() -> Self {
        Self {
            mips: vec![RgbaImage::from_pixel(1, 1, image::Rgba([255, 255, 255, 255]))],
            wrap: WrapMode::Repeat,
        }
    }

    pub fn width(&self) -> u32 {
        self.mips[0].width()
    }

    pub fn height(&self) -> u32 {
        self.mips[0].height()
    }
}

/// Halves each dimension (never below 1) until a 1x1 level is reached.
pub fn mip_chain(base: RgbaImage) -> Vec<RgbaImage> {
    let mut mips = vec![base];
    loop {
        let last = &mips[mips.len() - 1];
        let (w, h) = (last.width(), last.height());
        if w <= 1 && h <= 1 {
            break;
        }
        let next = image::imageops::resize(last, (w / 2).max(1), (h / 2).max(1), FilterType::Triangle);
        mips.push(next);
    }
    mips
}

/// A sampled texture living on the GPU.
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: TextureView,
    pub wrap: WrapMode,
    pub role: TextureRole,
}

impl Texture {
    pub fn upload(
        device: &Device,
        queue: &Queue,
        image: &TextureImage,
        role: TextureRole,
        label: &str,
    ) -> Self {
        let size = Extent3d {
            width: image.width(),
            height: image.height(),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: image.mips.len() as u32,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: role.format(),
            usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            view_formats: &[],
        });
        for (level, mip) in image.mips.iter().enumerate() {
            queue.write_texture(
                ImageCopyTexture {
                    texture: &texture,
                    mip_level: level as u32,
                    origin: Origin3d::ZERO,
                    aspect: TextureAspect::All,
                },
                mip.as_raw(),
                ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * mip.width()),
                    rows_per_image: Some(mip.height()),
                },
                Extent3d {
                    width: mip.width(),
                    height: mip.height(),
                    depth_or_array_layers: 1,
                },
            );
        }
        let view = texture.create_view(&TextureViewDescriptor::default());
        Self {
            texture,
            view,
            wrap: image.wrap,
            role,
        }
    }
}

/// Trilinear sampler for the given wrap mode.
pub fn create_sampler(device: &Device, wrap: WrapMode) -> Sampler {
    let address_mode = match wrap {
        WrapMode::Repeat => AddressMode::Repeat,
        WrapMode::ClampToEdge => AddressMode::ClampToEdge,
    };
    device.create_sampler(&SamplerDescriptor {
        label: Some(match wrap {
            WrapMode::Repeat => "repeat sampler",
            WrapMode::ClampToEdge => "clamp sampler",
        }),
        address_mode_u: address_mode,
        address_mode_v: address_mode,
        address_mode_w: address_mode,
        mag_filter: FilterMode::Linear,
        min_filter: FilterMode::Linear,
        mipmap_filter: FilterMode::Linear,
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba};

    #[test]
    fn only_color_maps_are_srgb() {
        assert_eq!(TextureRole::Color.format(), TextureFormat::Rgba8UnormSrgb);
        assert_eq!(TextureRole::Intensity.format(), TextureFormat::Rgba8Unorm);
        assert!(!TextureRole::Intensity.format().is_srgb());
    }

    #[test]
    fn mip_chain_reaches_one_texel() {
        let mips = mip_chain(RgbaImage::new(8, 2));
        let sizes: Vec<_> = mips.iter().map(|m| (m.width(), m.height())).collect();
        assert_eq!(sizes, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
    }

    #[test]
    fn single_texel_has_one_level() {
        assert_eq!(mip_chain(RgbaImage::new(1, 1)).len(), 1);
    }

    #[test]
    fn alpha_images_clamp() {
        let rgb = TextureImage::from_image(DynamicImage::ImageRgb8(RgbImage::new(4, 4)));
        let rgba = TextureImage::from_image(DynamicImage::ImageRgba8(RgbaImage::new(4, 4)));
        assert_eq!(rgb.wrap, WrapMode::Repeat);
        assert_eq!(rgba.wrap, WrapMode::ClampToEdge);
        assert_eq!(rgb.mips.len(), 3);
    }

    #[test]
    fn rows_are_flipped() {
        let mut img = RgbImage::new(1, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        img.put_pixel(0, 1, Rgb([0, 0, 255]));
        let tex = TextureImage::from_image(DynamicImage::ImageRgb8(img));
        assert_eq!(*tex.mips[0].get_pixel(0, 0), Rgba([0, 0, 255, 255]));
        assert_eq!(*tex.mips[0].get_pixel(0, 1), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn missing_file_falls_back_to_white() {
        let tex = TextureImage::load(Path::new("/nonexistent/grass01.jpg"));
        assert_eq!((tex.width(), tex.height()), (1, 1));
        assert_eq!(*tex.mips[0].get_pixel(0, 0), Rgba([255, 255, 255, 255]));
    }
}
