//! Raster statistics via `gdalinfo -stats`.

use std::path::Path;

use serde::Serialize;

use super::{ToolError, ToolInvocation, ToolRunner};

/// Summary of a raster as reported by gdalinfo.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RasterStatistics {
    /// Width and height in pixels.
    pub size: Option<(u64, u64)>,
    /// Upper-left corner in raster CRS units.
    pub origin: Option<(f64, f64)>,
    /// Pixel width and height (height is negative for north-up rasters).
    pub pixel_size: Option<(f64, f64)>,
    /// First band minimum.
    pub minimum: Option<f64>,
    /// First band maximum.
    pub maximum: Option<f64>,
    /// First band mean.
    pub mean: Option<f64>,
}

/// Run `gdalinfo -stats` on `path` and parse the key lines.
pub fn raster_statistics(
    runner: &dyn ToolRunner,
    path: &Path,
) -> Result<RasterStatistics, ToolError> {
    let invocation = ToolInvocation::new("gdalinfo").flag("-stats").input(path);
    let output = runner
        .invoke(invocation.program(), &invocation.args(None))?
        .into_result(invocation.program())?;

    Ok(parse_gdalinfo(&output.stdout))
}

/// Parse the size/origin/pixel/statistics lines of gdalinfo output.
pub(crate) fn parse_gdalinfo(text: &str) -> RasterStatistics {
    let mut stats = RasterStatistics::default();

    for line in text.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("Size is ") {
            stats.size = parse_pair(rest).and_then(|(w, h)| Some((w.parse().ok()?, h.parse().ok()?)));
        } else if let Some(rest) = line.strip_prefix("Origin = ") {
            stats.origin = parse_float_pair(rest);
        } else if let Some(rest) = line.strip_prefix("Pixel Size = ") {
            stats.pixel_size = parse_float_pair(rest);
        } else if line.starts_with("Minimum=") && stats.minimum.is_none() {
            for part in line.split(',').map(str::trim) {
                if let Some((key, value)) = part.split_once('=') {
                    let value = value.trim().parse::<f64>().ok();
                    match key {
                        "Minimum" => stats.minimum = value,
                        "Maximum" => stats.maximum = value,
                        "Mean" => stats.mean = value,
                        _ => {}
                    }
                }
            }
        }
    }

    stats
}

fn parse_pair(text: &str) -> Option<(&str, &str)> {
    let inner = text.trim().trim_start_matches('(').trim_end_matches(')');
    let (a, b) = inner.split_once(',')?;
    Some((a.trim(), b.trim()))
}

fn parse_float_pair(text: &str) -> Option<(f64, f64)> {
    let (a, b) = parse_pair(text)?;
    Some((a.parse().ok()?, b.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::ToolOutput;

    const SAMPLE: &str = "\
Driver: GTiff/GeoTIFF
Files: merged_dem_cropped.tif
Size is 25000, 10000
Coordinate System is:
GEOGCRS[\"WGS 84\"]
Origin = (20.000000000000000,60.000000000000000)
Pixel Size = (0.001000000000000,-0.001000000000000)
Band 1 Block=256x256 Type=Int16, ColorInterp=Gray
  Minimum=-30.000, Maximum=1695.000, Mean=171.522, StdDev=53.410
  NoData Value=-9999
Band 2 Block=256x256 Type=Int16, ColorInterp=Undefined
  Minimum=0.000, Maximum=1.000, Mean=0.500, StdDev=0.500
";

    struct StaticRunner(ToolOutput);

    impl ToolRunner for StaticRunner {
        fn invoke(&self, _program: &str, _args: &[String]) -> Result<ToolOutput, ToolError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_parse_gdalinfo() {
        let stats = parse_gdalinfo(SAMPLE);

        assert_eq!(stats.size, Some((25000, 10000)));
        assert_eq!(stats.origin, Some((20.0, 60.0)));
        assert_eq!(stats.pixel_size, Some((0.001, -0.001)));
        assert_eq!(stats.minimum, Some(-30.0));
        assert_eq!(stats.maximum, Some(1695.0));
        assert_eq!(stats.mean, Some(171.522));
    }

    #[test]
    fn test_parse_empty_output() {
        assert_eq!(parse_gdalinfo(""), RasterStatistics::default());
    }

    #[test]
    fn test_raster_statistics_via_runner() {
        let runner = StaticRunner(ToolOutput {
            exit_code: Some(0),
            stdout: SAMPLE.to_string(),
            stderr: String::new(),
        });

        let stats = raster_statistics(&runner, Path::new("dem.tif")).unwrap();
        assert_eq!(stats.size, Some((25000, 10000)));
    }

    #[test]
    fn test_raster_statistics_failure() {
        let runner = StaticRunner(ToolOutput {
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "ERROR 4: dem.tif: No such file or directory".to_string(),
        });

        let err = raster_statistics(&runner, Path::new("dem.tif")).unwrap_err();
        assert!(matches!(err, ToolError::Failed { .. }));
        assert!(err.to_string().contains("No such file"));
    }
}
