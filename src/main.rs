use glb_viewer::viewer::{self, ViewerConfig};

fn main() -> anyhow::Result<()> {
    viewer::run(ViewerConfig::default())
}
