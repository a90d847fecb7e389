// Copyright @yucwang 2026

//! XML medium descriptions.
//!
//! ```xml
//! <medium type="heterogeneous">
//!   <string name="method" value="simpson"/>
//!   <volume name="density" type="gridvolume">
//!     <string name="filename" value="smoke.vol"/>
//!   </volume>
//!   <volume name="albedo" type="constvolume">
//!     <rgb name="value" value="0.9, 0.9, 0.9"/>
//!   </volume>
//! </medium>
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::core::error::MediumError;
use crate::core::medium::Medium;
use crate::core::phase::{IsotropicPhaseFunction, KajiyaKayPhaseFunction, PhaseFunction};
use crate::core::volume::Volume;
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Matrix4f, Vector3f};
use crate::math::spectrum::RGBSpectrum;
use crate::math::transform::Transform;
use crate::media::heterogeneous_medium::{HeterogeneousMedium, IntegrationMethod};
use crate::media::homogeneous_medium::HomogeneousMedium;
use crate::volumes::const_volume::{ConstantValue, ConstantVolume};
use crate::volumes::grid_volume::GridVolume;
use crate::volumes::{VolumeFilterMode, VolumeWrapMode};

#[derive(Debug)]
pub enum MediumLoadError {
    Io(std::io::Error),
    Parse(String),
    MissingField(&'static str),
    Medium(MediumError),
}

impl From<std::io::Error> for MediumLoadError {
    fn from(err: std::io::Error) -> Self {
        MediumLoadError::Io(err)
    }
}

impl From<MediumError> for MediumLoadError {
    fn from(err: MediumError) -> Self {
        MediumLoadError::Medium(err)
    }
}

impl fmt::Display for MediumLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediumLoadError::Io(err) => write!(f, "i/o error: {}", err),
            MediumLoadError::Parse(msg) => write!(f, "parse error: {}", msg),
            MediumLoadError::MissingField(field) => write!(f, "missing field: {}", field),
            MediumLoadError::Medium(err) => write!(f, "invalid medium: {}", err),
        }
    }
}

impl std::error::Error for MediumLoadError {}

pub fn load_medium<P: AsRef<Path>>(path: P) -> Result<Box<dyn Medium>, MediumLoadError> {
    let path = path.as_ref();
    let xml = fs::read_to_string(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let medium = parse_medium(&xml, base_dir)?;
    log::info!("Loaded medium from {}.", path.display());
    Ok(medium)
}

/// Parses the first `<medium>` element of `xml`. Relative volume filenames
/// are resolved against `base_dir`.
pub fn parse_medium(xml: &str, base_dir: &Path) -> Result<Box<dyn Medium>, MediumLoadError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut parser = MediumParser::new(base_dir);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => parser.open(&e)?,
            Ok(Event::Empty(e)) => {
                parser.open(&e)?;
                parser.close(e.name().as_ref())?;
            }
            Ok(Event::End(e)) => parser.close(e.name().as_ref())?,
            Err(e) => {
                return Err(MediumLoadError::Parse(e.to_string()));
            }
            _ => {}
        }

        if parser.result.is_some() {
            break;
        }
        buf.clear();
    }

    parser.result.ok_or(MediumLoadError::MissingField("medium"))
}

#[derive(Default)]
struct VolumeDescription {
    role: String,
    kind: String,
    value: Option<ConstantValue>,
    min: Option<Vector3f>,
    max: Option<Vector3f>,
    filename: Option<String>,
    to_world: Option<Transform>,
    filter_mode: Option<String>,
    wrap_mode: Option<String>,
}

#[derive(Default)]
struct MediumDescription {
    kind: String,
    method: Option<String>,
    step_size: Option<Float>,
    scale: Option<Float>,
    transmittance_samples: Option<usize>,
    phase: Option<Arc<dyn PhaseFunction>>,
    density: Option<Arc<dyn Volume>>,
    albedo: Option<Arc<dyn Volume>>,
    orientation: Option<Arc<dyn Volume>>,
    sigma_a: Option<RGBSpectrum>,
    sigma_s: Option<RGBSpectrum>,
    min: Option<Vector3f>,
    max: Option<Vector3f>,
}

struct MediumParser<'a> {
    base_dir: &'a Path,
    defaults: HashMap<String, String>,
    medium: Option<MediumDescription>,
    volume: Option<VolumeDescription>,
    in_transform: bool,
    result: Option<Box<dyn Medium>>,
}

impl<'a> MediumParser<'a> {
    fn new(base_dir: &'a Path) -> Self {
        Self {
            base_dir,
            defaults: HashMap::new(),
            medium: None,
            volume: None,
            in_transform: false,
            result: None,
        }
    }

    fn open(&mut self, e: &BytesStart) -> Result<(), MediumLoadError> {
        let attrs = read_attributes(e, &self.defaults);
        match e.name().as_ref() {
            b"default" => {
                if let (Some(k), Some(v)) = (attrs.get("name"), attrs.get("value")) {
                    self.defaults.insert(k.clone(), v.clone());
                }
            }
            b"medium" => {
                let kind = attrs.get("type").ok_or(MediumLoadError::MissingField("medium.type"))?;
                self.medium = Some(MediumDescription {
                    kind: kind.clone(),
                    ..Default::default()
                });
            }
            b"phase" => {
                let medium = self.medium.as_mut().ok_or_else(|| outside_medium("phase"))?;
                let kind = attrs.get("type").ok_or(MediumLoadError::MissingField("phase.type"))?;
                let phase: Arc<dyn PhaseFunction> = match kind.as_str() {
                    "isotropic" => Arc::new(IsotropicPhaseFunction),
                    "kajiyakay" => Arc::new(KajiyaKayPhaseFunction::default()),
                    other => return Err(MediumLoadError::Parse(format!("unsupported phase function: {}", other))),
                };
                medium.phase = Some(phase);
            }
            b"volume" => {
                if self.medium.is_none() {
                    return Err(outside_medium("volume"));
                }
                let role = attrs.get("name").ok_or(MediumLoadError::MissingField("volume.name"))?;
                let kind = attrs.get("type").ok_or(MediumLoadError::MissingField("volume.type"))?;
                self.volume = Some(VolumeDescription {
                    role: role.clone(),
                    kind: kind.clone(),
                    ..Default::default()
                });
            }
            b"transform" => {
                if self.volume.is_some() {
                    self.in_transform = true;
                }
            }
            b"translate" => {
                if let (true, Some(volume)) = (self.in_transform, self.volume.as_mut()) {
                    let offset = Vector3f::new(
                        parse_float_or(&attrs, "x", 0.0)?,
                        parse_float_or(&attrs, "y", 0.0)?,
                        parse_float_or(&attrs, "z", 0.0)?,
                    );
                    let current = volume.to_world.unwrap_or_default();
                    volume.to_world = Some(Transform::translate(offset).compose(&current));
                }
            }
            b"scale" => {
                if let (true, Some(volume)) = (self.in_transform, self.volume.as_mut()) {
                    let s = match attrs.get("value") {
                        Some(v) => Vector3f::repeat(parse_float(v)?),
                        None => Vector3f::new(
                            parse_float_or(&attrs, "x", 1.0)?,
                            parse_float_or(&attrs, "y", 1.0)?,
                            parse_float_or(&attrs, "z", 1.0)?,
                        ),
                    };
                    let scale = Transform::try_new(Matrix4f::new_nonuniform_scaling(&s)).ok_or_else(|| {
                        MediumError::InvalidParameter(format!("to_world scale {:?} is not invertible", s))
                    })?;
                    let current = volume.to_world.unwrap_or_default();
                    volume.to_world = Some(scale.compose(&current));
                }
            }
            tag @ b"float" | tag @ b"integer" | tag @ b"string" | tag @ b"rgb" | tag @ b"point" | tag @ b"vector" => {
                let tag = String::from_utf8_lossy(tag).to_string();
                let name = attrs
                    .get("name")
                    .ok_or_else(|| MediumLoadError::Parse(format!("<{}> without a name", tag)))?;
                if let Some(volume) = self.volume.as_mut() {
                    volume_property(volume, &tag, name, &attrs)?;
                } else if let Some(medium) = self.medium.as_mut() {
                    medium_property(medium, &tag, name, &attrs)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, name: &[u8]) -> Result<(), MediumLoadError> {
        match name {
            b"transform" => self.in_transform = false,
            b"volume" => {
                if let Some(desc) = self.volume.take() {
                    let volume = build_volume(&desc, self.base_dir)?;
                    let medium = self.medium.as_mut().ok_or_else(|| outside_medium("volume"))?;
                    match desc.role.as_str() {
                        "density" => medium.density = Some(volume),
                        "albedo" => medium.albedo = Some(volume),
                        "orientation" => medium.orientation = Some(volume),
                        other => return Err(MediumLoadError::Parse(format!("unknown volume role: {}", other))),
                    }
                }
            }
            b"medium" => {
                if let Some(desc) = self.medium.take() {
                    self.result = Some(build_medium(desc)?);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

fn outside_medium(tag: &str) -> MediumLoadError {
    MediumLoadError::Parse(format!("<{}> must appear inside <medium>", tag))
}

fn read_attributes(e: &BytesStart, defaults: &HashMap<String, String>) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for attr in e.attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = resolve_value(&attr.unescape_value().unwrap_or_default(), defaults);
        attrs.insert(key, value);
    }
    attrs
}

fn medium_property(
    medium: &mut MediumDescription,
    tag: &str,
    name: &str,
    attrs: &HashMap<String, String>,
) -> Result<(), MediumLoadError> {
    match (tag, name) {
        ("string", "method") => medium.method = Some(required_value(attrs)?.to_string()),
        ("float", "step_size") | ("float", "stepSize") => {
            medium.step_size = Some(parse_float(required_value(attrs)?)?)
        }
        ("float", "scale") | ("float", "densityMultiplier") => {
            medium.scale = Some(parse_float(required_value(attrs)?)?)
        }
        ("integer", "transmittance_samples") => {
            medium.transmittance_samples = Some(parse_usize(required_value(attrs)?)?)
        }
        ("rgb", "sigma_a") | ("float", "sigma_a") => medium.sigma_a = Some(parse_rgb(required_value(attrs)?)?),
        ("rgb", "sigma_s") | ("float", "sigma_s") => medium.sigma_s = Some(parse_rgb(required_value(attrs)?)?),
        ("point", "min") => medium.min = Some(parse_point(attrs)?),
        ("point", "max") => medium.max = Some(parse_point(attrs)?),
        _ => log::warn!("Ignoring unused medium property <{} name=\"{}\">.", tag, name),
    }
    Ok(())
}

fn volume_property(
    volume: &mut VolumeDescription,
    tag: &str,
    name: &str,
    attrs: &HashMap<String, String>,
) -> Result<(), MediumLoadError> {
    match (tag, name) {
        ("float", "value") => volume.value = Some(ConstantValue::Scalar(parse_float(required_value(attrs)?)?)),
        ("rgb", "value") => volume.value = Some(ConstantValue::Spectrum(parse_rgb(required_value(attrs)?)?)),
        ("vector", "value") => volume.value = Some(ConstantValue::Vector(parse_point(attrs)?)),
        ("point", "min") => volume.min = Some(parse_point(attrs)?),
        ("point", "max") => volume.max = Some(parse_point(attrs)?),
        ("string", "filename") => volume.filename = Some(required_value(attrs)?.to_string()),
        ("string", "filter_mode") => volume.filter_mode = Some(required_value(attrs)?.to_string()),
        ("string", "wrap_mode") => volume.wrap_mode = Some(required_value(attrs)?.to_string()),
        _ => log::warn!(
            "Ignoring unused property <{} name=\"{}\"> of the {} volume.",
            tag,
            name,
            volume.role
        ),
    }
    Ok(())
}

fn build_volume(desc: &VolumeDescription, base_dir: &Path) -> Result<Arc<dyn Volume>, MediumLoadError> {
    match desc.kind.as_str() {
        "constvolume" => {
            let value = desc.value.ok_or(MediumLoadError::MissingField("constvolume.value"))?;
            let volume = match value {
                ConstantValue::Scalar(v) => ConstantVolume::new_scalar(v),
                ConstantValue::Spectrum(s) => ConstantVolume::new_rgb(s),
                ConstantValue::Vector(v) => ConstantVolume::new_vector(v),
            };
            let bbox = match (desc.min, desc.max) {
                (Some(min), Some(max)) => Some(AABB::new(min, max)),
                (None, None) => None,
                _ => return Err(MediumLoadError::Parse("constvolume needs both min and max".to_string())),
            };
            Ok(Arc::new(volume.with_bbox(bbox)))
        }
        "gridvolume" => {
            let filename = desc.filename.as_ref().ok_or(MediumLoadError::MissingField("gridvolume.filename"))?;
            let path: PathBuf = base_dir.join(filename);
            let mut grid = GridVolume::from_file(&path)?;
            if let Some(to_world) = desc.to_world {
                grid.set_transform(to_world);
            }
            if let Some(mode) = &desc.filter_mode {
                grid.set_filter_mode(mode.parse::<VolumeFilterMode>().map_err(MediumLoadError::Parse)?);
            }
            if let Some(mode) = &desc.wrap_mode {
                grid.set_wrap_mode(mode.parse::<VolumeWrapMode>().map_err(MediumLoadError::Parse)?);
            }
            Ok(Arc::new(grid))
        }
        other => Err(MediumLoadError::Parse(format!("unsupported volume type: {}", other))),
    }
}

fn build_medium(desc: MediumDescription) -> Result<Box<dyn Medium>, MediumLoadError> {
    match desc.kind.as_str() {
        "heterogeneous" => {
            if desc.sigma_a.is_some() || desc.sigma_s.is_some() {
                return Err(MediumLoadError::Medium(MediumError::InvalidParameter(
                    "sigma_a and sigma_s cannot be used with a heterogeneous medium, \
                     specify density and albedo volumes instead"
                        .to_string(),
                )));
            }
            let mut builder = HeterogeneousMedium::builder();
            if let Some(density) = desc.density {
                builder = builder.with_density(density);
            }
            if let Some(albedo) = desc.albedo {
                builder = builder.with_albedo(albedo);
            }
            if let Some(orientation) = desc.orientation {
                builder = builder.with_orientation(orientation);
            }
            if let Some(phase) = desc.phase {
                builder = builder.with_phase_function(phase);
            }
            if let Some(method) = &desc.method {
                builder = builder.with_method(method.parse::<IntegrationMethod>()?);
            }
            if let Some(step_size) = desc.step_size {
                builder = builder.with_step_size(step_size);
            }
            if let Some(scale) = desc.scale {
                builder = builder.with_density_multiplier(scale);
            }
            if let Some(samples) = desc.transmittance_samples {
                builder = builder.with_transmittance_samples(samples);
            }
            Ok(Box::new(builder.build()?))
        }
        "homogeneous" => {
            if desc.density.is_some() || desc.albedo.is_some() || desc.orientation.is_some() {
                return Err(MediumLoadError::Parse(
                    "volumes are only supported by heterogeneous media".to_string(),
                ));
            }
            let sigma_a = desc.sigma_a.ok_or(MediumLoadError::MissingField("medium.sigma_a"))?;
            let sigma_s = desc.sigma_s.ok_or(MediumLoadError::MissingField("medium.sigma_s"))?;
            let bbox = match (desc.min, desc.max) {
                (Some(min), Some(max)) => Some(AABB::new(min, max)),
                (None, None) => None,
                _ => return Err(MediumLoadError::Parse("medium bound needs both min and max".to_string())),
            };
            let medium = HomogeneousMedium::new(sigma_a, sigma_s)?
                .with_scale(desc.scale.unwrap_or(1.0))?
                .with_bbox(bbox);
            Ok(Box::new(medium))
        }
        other => Err(MediumLoadError::Parse(format!("unsupported medium type: {}", other))),
    }
}

fn resolve_value(raw: &str, defaults: &HashMap<String, String>) -> String {
    let mut out = raw.to_string();
    for (k, v) in defaults {
        out = out.replace(&format!("${}", k), v);
    }
    out
}

fn required_value(attrs: &HashMap<String, String>) -> Result<&str, MediumLoadError> {
    attrs
        .get("value")
        .map(|v| v.as_str())
        .ok_or(MediumLoadError::MissingField("value"))
}

fn parse_float(value: &str) -> Result<Float, MediumLoadError> {
    value.trim().parse::<Float>().map_err(|_| MediumLoadError::Parse(format!("invalid float: {}", value)))
}

fn parse_float_or(attrs: &HashMap<String, String>, key: &str, default: Float) -> Result<Float, MediumLoadError> {
    match attrs.get(key) {
        Some(v) => parse_float(v),
        None => Ok(default),
    }
}

fn parse_usize(value: &str) -> Result<usize, MediumLoadError> {
    value.trim().parse::<usize>().map_err(|_| MediumLoadError::Parse(format!("invalid integer: {}", value)))
}

fn parse_vec3(value: &str) -> Result<Vector3f, MediumLoadError> {
    let mut parts = value.split(',').map(|s| s.trim()).filter(|s| !s.is_empty());
    let x = parts.next().ok_or_else(|| MediumLoadError::Parse("invalid vec3".to_string()))?;
    let y = parts.next().ok_or_else(|| MediumLoadError::Parse("invalid vec3".to_string()))?;
    let z = parts.next().ok_or_else(|| MediumLoadError::Parse("invalid vec3".to_string()))?;
    Ok(Vector3f::new(parse_float(x)?, parse_float(y)?, parse_float(z)?))
}

/// `value="x, y, z"` or separate `x`/`y`/`z` attributes.
fn parse_point(attrs: &HashMap<String, String>) -> Result<Vector3f, MediumLoadError> {
    match attrs.get("value") {
        Some(v) => parse_vec3(v),
        None => Ok(Vector3f::new(
            parse_float_or(attrs, "x", 0.0)?,
            parse_float_or(attrs, "y", 0.0)?,
            parse_float_or(attrs, "z", 0.0)?,
        )),
    }
}

/// A single number is a grey spectrum.
fn parse_rgb(value: &str) -> Result<RGBSpectrum, MediumLoadError> {
    if value.contains(',') {
        let v = parse_vec3(value)?;
        Ok(RGBSpectrum::new(v.x, v.y, v.z))
    } else {
        Ok(RGBSpectrum::from_value(parse_float(value)?))
    }
}
