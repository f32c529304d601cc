use std::str::FromStr;

use foundation::bounds::GeoBounds;
use foundation::time::CalendarDate;

use crate::error::LayerError;
use crate::layer::{LayerId, LayerKind};
use crate::raster::{ImageFormat, ImageryLayerDescriptor};

pub const GIBS_ENDPOINT: &str = "https://gibs.earthdata.nasa.gov/wmts/epsg3857/best";
pub const GIBS_MATRIX_SET: &str = "GoogleMapsCompatible_Level9";
pub const GIBS_MAX_ZOOM: u8 = 9;
pub const GIBS_ATTRIBUTION: &str = "© NASA Earthdata";

/// Dated imagery products the viewer can overlay.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ImageryType {
    ModisTrueColor,
    ViirsTrueColor,
    LandsatTrueColor,
    ModisNdvi,
    ModisLandSurfaceTemp,
    ViirsNightLights,
}

impl ImageryType {
    pub const ALL: [ImageryType; 6] = [
        ImageryType::ModisTrueColor,
        ImageryType::ViirsTrueColor,
        ImageryType::LandsatTrueColor,
        ImageryType::ModisNdvi,
        ImageryType::ModisLandSurfaceTemp,
        ImageryType::ViirsNightLights,
    ];

    /// Identifier used by selection inputs.
    pub fn id(&self) -> &'static str {
        match self {
            ImageryType::ModisTrueColor => "modis",
            ImageryType::ViirsTrueColor => "viirs",
            ImageryType::LandsatTrueColor => "landsat-true",
            ImageryType::ModisNdvi => "landsat-ndvi",
            ImageryType::ModisLandSurfaceTemp => "landsat-temp",
            ImageryType::ViirsNightLights => "night-lights",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImageryType::ModisTrueColor => "MODIS Terra - True Color",
            ImageryType::ViirsTrueColor => "VIIRS SNPP - True Color",
            ImageryType::LandsatTrueColor => "Landsat - True Colour",
            ImageryType::ModisNdvi => "MODIS - NDVI",
            ImageryType::ModisLandSurfaceTemp => "MODIS - Land Surface Temperature",
            ImageryType::ViirsNightLights => "VIIRS - Black Marble (Night Lights)",
        }
    }

    /// GIBS layer identifier.
    pub fn layer_name(&self) -> &'static str {
        match self {
            ImageryType::ModisTrueColor => "MODIS_Terra_CorrectedReflectance_TrueColor",
            ImageryType::ViirsTrueColor => "VIIRS_SNPP_CorrectedReflectance_TrueColor",
            ImageryType::LandsatTrueColor => {
                "Landsat_WELD_CorrectedReflectance_TrueColor_Global_Annual"
            }
            ImageryType::ModisNdvi => "MODIS_Terra_NDVI_8Day",
            ImageryType::ModisLandSurfaceTemp => "MODIS_Aqua_Land_Surface_Temp_Day",
            ImageryType::ViirsNightLights => "VIIRS_Black_Marble",
        }
    }

    pub fn format(&self) -> ImageFormat {
        match self {
            ImageryType::ModisNdvi | ImageryType::ModisLandSurfaceTemp => ImageFormat::Png,
            _ => ImageFormat::Jpeg,
        }
    }

    /// Exact id match; anything outside the enumerated set is `None`.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }
}

impl FromStr for ImageryType {
    type Err = LayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| LayerError::UnknownImagery(s.to_string()))
    }
}

/// Builds dated WMTS tile descriptors:
/// `{endpoint}/{layer}/default/{yyyy-MM-dd}/{matrix_set}/{z}/{y}/{x}.{ext}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLayerFactory {
    endpoint: String,
    matrix_set: String,
    max_zoom: u8,
}

impl Default for TileLayerFactory {
    fn default() -> Self {
        Self::new(GIBS_ENDPOINT, GIBS_MATRIX_SET)
    }
}

impl TileLayerFactory {
    pub fn new(endpoint: impl Into<String>, matrix_set: impl Into<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self {
            endpoint,
            matrix_set: matrix_set.into(),
            max_zoom: GIBS_MAX_ZOOM,
        }
    }

    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn matrix_set(&self) -> &str {
        &self.matrix_set
    }

    /// Descriptor for an imagery id at `date` (today when `None`).
    ///
    /// Unknown ids yield `None`: the overlay is simply absent.
    pub fn build(
        &self,
        imagery_type: &str,
        date: Option<CalendarDate>,
    ) -> Option<ImageryLayerDescriptor> {
        ImageryType::from_id(imagery_type).map(|t| self.build_for(t, date))
    }

    pub fn build_for(
        &self,
        imagery: ImageryType,
        date: Option<CalendarDate>,
    ) -> ImageryLayerDescriptor {
        let date = date.unwrap_or_else(CalendarDate::today);
        let template = format!(
            "{}/{}/default/{}/{}/{{z}}/{{y}}/{{x}}.{}",
            self.endpoint,
            imagery.layer_name(),
            date,
            self.matrix_set,
            imagery.format().extension()
        );
        ImageryLayerDescriptor::new(
            LayerId::new(format!("{}@{}", imagery.id(), date)),
            LayerKind::Imagery,
            template,
            imagery.format(),
        )
        .with_name(imagery.label())
        .with_zoom_range(0, self.max_zoom)
        .with_tile_size(256)
        .with_bounds(GeoBounds::WORLD)
        .with_attribution(GIBS_ATTRIBUTION)
    }
}
