#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("mesh_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use procmesh_engine::cloth::{ClothMesh, ClothParams, ClothSimulator};
    use procmesh_engine::geom::{
        CsgPolygon, CubicBezier3, GeomMetrics, MeshBuffers, MeshDiagnostics, Point3, TextureMode,
        csg_to_mesh,
    };
    use procmesh_engine::shapes::{
        BezierTube, Cone, ExtrudedText, GlyphOutline, Knot, Polyhedron, PolyhedronKind, Prism,
        Shape, ShapeParams, SphereSegment, Spring, SurfacePlot, Torus,
    };
    use std::fmt::Write as _;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    const SNAPSHOT_QUANTIZE: f64 = 1e-6;
    const SNAPSHOT_DECIMALS: usize = 6;

    const USAGE: &str = r#"mesh_cli (procmesh-engine)

USAGE:
  mesh_cli list
  mesh_cli run <scenario|all> [options]
  mesh_cli shape <json|@file> [options]

SCENARIOS:
  torus
  trefoil_knot
  spring
  bezier_tube
  sphere_wedge
  cone
  prism
  icosphere
  surface_plot
  text_frame
  csg_cube
  cloth_settle

OPTIONS (run):
  --texture <mode>   none | image | arc_length | radius | faces (default: none)
  --colors <n>       Palette size for the colored modes (default: 16)
  --out-dir <dir>    Write <scenario>.snap to this dir (required for `all`)
  --snap <path>      Write snapshot (single scenario only)
  --overwrite        Overwrite existing output files
  -h, --help         Show this help

OPTIONS (shape):
  --texture, --colors, --snap and --overwrite as for `run`.
  The parameters are a JSON object tagged by "shape", e.g.
  '{"shape": "torus", "radius_divisions": 32}'; missing fields take defaults.
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                print_scenarios();
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "shape" => cmd_shape(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn print_scenarios() {
        for scenario in Scenario::ALL {
            println!("{}", scenario.name());
        }
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut out_dir: Option<PathBuf> = None;
        let mut snap_path: Option<PathBuf> = None;
        let mut overwrite = false;
        let mut texture_name = "none".to_string();
        let mut colors = 16usize;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                "--snap" => snap_path = Some(PathBuf::from(args.value("--snap")?)),
                "--texture" => texture_name = args.value("--texture")?,
                "--colors" => {
                    colors = args
                        .value("--colors")?
                        .parse()
                        .map_err(|e| format!("--colors: {e}"))?;
                }
                "--overwrite" => overwrite = true,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        let texture = texture_mode(&texture_name, colors)?;

        if let Some(dir) = out_dir.as_ref() {
            if snap_path.is_some() {
                return Err("use either --out-dir or --snap (not both)".to_string());
            }
            fs::create_dir_all(dir).map_err(|e| format!("create out dir: {e}"))?;

            if scenario_name == "all" {
                for scenario in Scenario::ALL {
                    run_one_scenario_to_dir(*scenario, &texture, dir, overwrite)?;
                }
                return Ok(());
            }

            let scenario = Scenario::from_str(scenario_name.as_str())
                .ok_or_else(|| unknown_scenario(&scenario_name))?;
            return run_one_scenario_to_dir(scenario, &texture, dir, overwrite);
        }

        if scenario_name == "all" {
            return Err("`run all` requires --out-dir".to_string());
        }

        let scenario =
            Scenario::from_str(scenario_name.as_str()).ok_or_else(|| unknown_scenario(&scenario_name))?;
        let output = run_scenario(scenario, &texture)?;

        if let Some(path) = snap_path.as_deref() {
            write_text_file(path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        } else {
            print!("{}", output.snapshot);
        }
        report(&output);

        Ok(())
    }

    fn cmd_shape(args: &mut Args) -> Result<(), String> {
        let source = args.next().ok_or("missing shape parameters")?;
        let json = match source.strip_prefix('@') {
            Some(path) => fs::read_to_string(path).map_err(|e| format!("read {path}: {e}"))?,
            None => source,
        };
        let params: ShapeParams =
            serde_json::from_str(&json).map_err(|e| format!("shape parameters: {e}"))?;

        let mut snap_path: Option<PathBuf> = None;
        let mut overwrite = false;
        let mut texture_name = "none".to_string();
        let mut colors = 16usize;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--snap" => snap_path = Some(PathBuf::from(args.value("--snap")?)),
                "--texture" => texture_name = args.value("--texture")?,
                "--colors" => {
                    colors = args
                        .value("--colors")?
                        .parse()
                        .map_err(|e| format!("--colors: {e}"))?;
                }
                "--overwrite" => overwrite = true,
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        let texture = texture_mode(&texture_name, colors)?;
        let output = shape_scenario(params.name(), &params, &texture)?;
        match snap_path.as_deref() {
            Some(path) => {
                write_text_file(path, &output.snapshot, overwrite)?;
                eprintln!("wrote {}", path.display());
            }
            None => print!("{}", output.snapshot),
        }
        report(&output);
        Ok(())
    }

    fn run_one_scenario_to_dir(
        scenario: Scenario,
        texture: &TextureMode,
        dir: &Path,
        overwrite: bool,
    ) -> Result<(), String> {
        let output = run_scenario(scenario, texture)?;
        let path = dir.join(format!("{}.snap", output.name));
        write_text_file(&path, &output.snapshot, overwrite)?;
        eprintln!("wrote {}", path.display());
        report(&output);
        Ok(())
    }

    fn report(output: &ScenarioOutput) {
        eprintln!(
            "{}: vertices={} triangles={} | {}",
            output.name,
            output.mesh.vertex_count(),
            output.mesh.face_count(),
            output.mesh_diag.summary()
        );
        if let Some(timing) = output.mesh_diag.timing.as_ref() {
            eprintln!("{}: {:.3} ms", output.name, timing.total_ms());
        }
    }

    fn texture_mode(name: &str, colors: usize) -> Result<TextureMode, String> {
        match name {
            "none" => Ok(TextureMode::None),
            "image" => Ok(TextureMode::Image),
            "arc_length" => Ok(TextureMode::colored_by_arc_length(colors)),
            "radius" => Ok(TextureMode::colored_by_radius(colors)),
            "faces" => Ok(TextureMode::ColoredFaces { colors }),
            other => Err(format!("unknown texture mode `{other}`")),
        }
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = String::new();
        let _ = writeln!(msg, "unknown scenario `{name}`\n\navailable scenarios:");
        for scenario in Scenario::ALL {
            let _ = writeln!(msg, "  {}", scenario.name());
        }
        msg
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        fs::write(path, normalize_snapshot_text(text)).map_err(|e| format!("write {}: {e}", path.display()))
    }

    fn normalize_snapshot_text(text: &str) -> String {
        let normalized = text.replace("\r\n", "\n");
        if normalized.ends_with('\n') {
            normalized
        } else {
            format!("{normalized}\n")
        }
    }

    fn quantize_f64(value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
        if q == 0.0 { 0.0 } else { q }
    }

    fn write_f64(out: &mut String, value: f64) {
        let value = quantize_f64(value);
        let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
    }

    fn write_floats_line(out: &mut String, prefix: &str, values: &[f32]) {
        let _ = write!(out, "{prefix}");
        for value in values {
            out.push(' ');
            write_f64(out, f64::from(*value));
        }
        out.push('\n');
    }

    fn write_mesh_diagnostics(out: &mut String, diag: &MeshDiagnostics) {
        let _ = writeln!(out, "mesh_diag.vertex_count {}", diag.vertex_count);
        let _ = writeln!(out, "mesh_diag.triangle_count {}", diag.triangle_count);
        let _ = writeln!(out, "mesh_diag.open_edge_count {}", diag.open_edge_count);
        let _ = writeln!(
            out,
            "mesh_diag.non_manifold_edge_count {}",
            diag.non_manifold_edge_count
        );
        let _ = writeln!(
            out,
            "mesh_diag.inconsistent_edge_count {}",
            diag.inconsistent_edge_count
        );
        let _ = writeln!(out, "mesh_diag.orphan_vertex_count {}", diag.orphan_vertex_count);
        let _ = writeln!(
            out,
            "mesh_diag.degenerate_triangle_count {}",
            diag.degenerate_triangle_count
        );
        let _ = writeln!(out, "mesh_diag.fallback_frame_count {}", diag.fallback_frame_count);
        let _ = writeln!(out, "mesh_diag.merged_vertex_count {}", diag.merged_vertex_count);
        let _ = write!(out, "mesh_diag.signed_volume ");
        write_f64(out, diag.signed_volume);
        out.push('\n');
        let _ = writeln!(out, "mesh_diag.warning_count {}", diag.warnings.len());
        for (idx, warning) in diag.warnings.iter().enumerate() {
            let _ = writeln!(out, "mesh_diag.warning.{idx} {warning}");
        }
    }

    fn write_mesh(out: &mut String, mesh: &MeshBuffers) {
        let _ = writeln!(out, "mesh.points {}", mesh.vertex_count());
        for p in mesh.points.chunks_exact(3) {
            write_floats_line(out, "v", p);
        }
        let _ = writeln!(out, "mesh.tex_coords {}", mesh.tex_coord_count());
        for t in mesh.tex_coords.chunks_exact(2) {
            write_floats_line(out, "vt", t);
        }
        let _ = writeln!(out, "mesh.faces {}", mesh.face_count());
        for f in mesh.faces.chunks_exact(6) {
            let _ = writeln!(out, "f {} {} {} {} {} {}", f[0], f[1], f[2], f[3], f[4], f[5]);
        }
    }

    fn snapshot(op: &str, texture: &TextureMode, sections: impl FnOnce(&mut String)) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# procmesh-engine golden v1");
        let _ = writeln!(out, "op {op}");
        let _ = writeln!(out, "texture {}", texture.name());
        let _ = writeln!(out, "quantize {SNAPSHOT_QUANTIZE:.1e}");
        sections(&mut out);
        normalize_snapshot_text(&out)
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        Torus,
        TrefoilKnot,
        Spring,
        BezierTube,
        SphereWedge,
        Cone,
        Prism,
        Icosphere,
        SurfacePlot,
        TextFrame,
        CsgCube,
        ClothSettle,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::Torus,
            Scenario::TrefoilKnot,
            Scenario::Spring,
            Scenario::BezierTube,
            Scenario::SphereWedge,
            Scenario::Cone,
            Scenario::Prism,
            Scenario::Icosphere,
            Scenario::SurfacePlot,
            Scenario::TextFrame,
            Scenario::CsgCube,
            Scenario::ClothSettle,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::Torus => "torus",
                Scenario::TrefoilKnot => "trefoil_knot",
                Scenario::Spring => "spring",
                Scenario::BezierTube => "bezier_tube",
                Scenario::SphereWedge => "sphere_wedge",
                Scenario::Cone => "cone",
                Scenario::Prism => "prism",
                Scenario::Icosphere => "icosphere",
                Scenario::SurfacePlot => "surface_plot",
                Scenario::TextFrame => "text_frame",
                Scenario::CsgCube => "csg_cube",
                Scenario::ClothSettle => "cloth_settle",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            Self::ALL.iter().copied().find(|scenario| scenario.name() == name)
        }
    }

    struct ScenarioOutput {
        name: &'static str,
        mesh: MeshBuffers,
        mesh_diag: MeshDiagnostics,
        snapshot: String,
    }

    fn run_scenario(scenario: Scenario, texture: &TextureMode) -> Result<ScenarioOutput, String> {
        let name = scenario.name();
        match scenario {
            Scenario::Torus => shape_scenario(name, &Torus::new(3.0, 1.0, 24, 12), texture),
            Scenario::TrefoilKnot => shape_scenario(
                name,
                &Knot {
                    length_divisions: 96,
                    wire_divisions: 8,
                    ..Knot::default()
                },
                texture,
            ),
            Scenario::Spring => shape_scenario(
                name,
                &Spring {
                    length_divisions: 64,
                    wire_divisions: 8,
                    ..Spring::default()
                },
                texture,
            ),
            Scenario::BezierTube => {
                let curve = CubicBezier3::new(
                    Point3::new(0.0, 0.0, 0.0),
                    Point3::new(2.0, 4.0, 0.0),
                    Point3::new(6.0, -4.0, 2.0),
                    Point3::new(8.0, 0.0, 0.0),
                );
                let tube = BezierTube {
                    length_divisions: 32,
                    wire_divisions: 8,
                    ..BezierTube::new(curve, 0.5)
                };
                shape_scenario(name, &tube, texture)
            }
            Scenario::SphereWedge => {
                let sphere = SphereSegment {
                    crop_azimuth: 2,
                    ..SphereSegment::new(2.0, 16, 8)
                };
                shape_scenario(name, &sphere, texture)
            }
            Scenario::Cone => shape_scenario(name, &Cone::new(16, 1.0, 2.0), texture),
            Scenario::Prism => shape_scenario(
                name,
                &Prism::between(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 3.0), 1.0, 6),
                texture,
            ),
            Scenario::Icosphere => {
                shape_scenario(name, &Polyhedron::new(PolyhedronKind::Icosahedron, 1), texture)
            }
            Scenario::SurfacePlot => {
                let plot = SurfacePlot {
                    divisions_x: 12,
                    divisions_y: 12,
                    width: 6.0,
                    depth: 6.0,
                    ..SurfacePlot::from_expression("sin(x) * cos(y)")
                };
                shape_scenario(name, &plot, texture)
            }
            Scenario::TextFrame => {
                let text = ExtrudedText::new(
                    vec![GlyphOutline::frame(3.0, 4.0, 0.75), GlyphOutline::block(1.0, 4.0)],
                    0.5,
                );
                shape_scenario(name, &text, texture)
            }
            Scenario::CsgCube => scenario_csg_cube(texture),
            Scenario::ClothSettle => scenario_cloth_settle(texture),
        }
    }

    fn shape_scenario(
        name: &'static str,
        shape: &dyn Shape,
        texture: &TextureMode,
    ) -> Result<ScenarioOutput, String> {
        let mut metrics = GeomMetrics::default();
        let (mesh, diag) = shape
            .generate_timed(texture, &mut metrics)
            .map_err(|e| e.to_string())?;
        mesh.validate().map_err(|e| format!("mesh validation failed: {e}"))?;

        let snap = snapshot(name, texture, |out| {
            write_mesh_diagnostics(out, &diag);
            write_mesh(out, &mesh);
        });

        Ok(ScenarioOutput {
            name,
            mesh,
            mesh_diag: diag,
            snapshot: snap,
        })
    }

    fn scenario_csg_cube(texture: &TextureMode) -> Result<ScenarioOutput, String> {
        let c = |x: f64, y: f64, z: f64| [x, y, z];
        let polygons: Vec<CsgPolygon> = vec![
            vec![c(0., 0., 0.), c(0., 1., 0.), c(1., 1., 0.), c(1., 0., 0.)],
            vec![c(0., 0., 1.), c(1., 0., 1.), c(1., 1., 1.), c(0., 1., 1.)],
            vec![c(0., 0., 0.), c(1., 0., 0.), c(1., 0., 1.), c(0., 0., 1.)],
            vec![c(0., 1., 0.), c(0., 1., 1.), c(1., 1., 1.), c(1., 1., 0.)],
            vec![c(0., 0., 0.), c(0., 0., 1.), c(0., 1., 1.), c(0., 1., 0.)],
            vec![c(1., 0., 0.), c(1., 1., 0.), c(1., 1., 1.), c(1., 0., 1.)],
        ]
        .into_iter()
        .map(CsgPolygon::from)
        .collect();

        let references: usize = polygons.iter().map(|p| p.vertices.len()).sum();
        let geometry = csg_to_mesh(&polygons).map_err(|e| e.to_string())?;
        // Polygon soups carry no UVs.
        let untextured = TextureMode::None;
        let texture = match texture {
            TextureMode::Image => &untextured,
            other => other,
        };
        let mesh = geometry.assemble(texture).map_err(|e| e.to_string())?;
        let mut diag = MeshDiagnostics::from_geometry(&geometry);
        diag.merged_vertex_count = references - geometry.vertex_count();

        let snap = snapshot("csg_cube", texture, |out| {
            write_mesh_diagnostics(out, &diag);
            write_mesh(out, &mesh);
        });

        Ok(ScenarioOutput {
            name: "csg_cube",
            mesh,
            mesh_diag: diag,
            snapshot: snap,
        })
    }

    fn scenario_cloth_settle(texture: &TextureMode) -> Result<ScenarioOutput, String> {
        const STEP: Duration = Duration::from_millis(16);
        const TICKS: usize = 240;

        let params = ClothParams::new(1.0, 1.0, 6, 6);
        let cloth = ClothMesh::with_texture(params, texture).map_err(|e| e.to_string())?;
        let mut sim = ClothSimulator::new(cloth);
        for _ in 0..TICKS {
            sim.advance(STEP);
        }
        let mesh = sim.cloth().buffers().clone();
        mesh.validate().map_err(|e| format!("mesh validation failed: {e}"))?;

        let diag = MeshDiagnostics {
            vertex_count: mesh.vertex_count(),
            triangle_count: mesh.face_count(),
            ..MeshDiagnostics::default()
        };

        let snap = snapshot("cloth_settle", texture, |out| {
            let _ = writeln!(out, "cloth.ticks {TICKS}");
            let _ = writeln!(out, "cloth.steps {}", sim.steps());
            let _ = writeln!(out, "cloth.links {}", sim.cloth().links().len());
            let _ = writeln!(out, "cloth.colours {}", sim.colour_count());
            write_mesh(out, &mesh);
        });

        Ok(ScenarioOutput {
            name: "cloth_settle",
            mesh,
            mesh_diag: diag,
            snapshot: snap,
        })
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
