//! Entry point for the depth cloud viewer.

use anyhow::Result;
use clap::Parser;
use depthcloud_viewer::{app::App, config::Config};
use std::sync::Arc;
use winit::{
    event::{Event, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::WindowBuilder,
};

fn main() -> Result<()> {
    // Initialize logging; default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::parse();
    log::info!(
        "Preset '{}', source '{}'",
        config.preset,
        config.source_dir().display()
    );

    let event_loop = EventLoop::new()?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(format!("Depth Cloud - {}", config.preset))
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720))
            .build(&event_loop)?,
    );

    let mut app = pollster::block_on(App::new(window.clone(), &config))?;

    event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => {
                if !app.handle_event(&window, &event) {
                    match event {
                        WindowEvent::CloseRequested => elwt.exit(),
                        WindowEvent::KeyboardInput { event, .. } => {
                            if event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                                elwt.exit();
                            }
                        }
                        WindowEvent::RedrawRequested => {
                            if let Err(err) = app.render(&window) {
                                match err.downcast_ref::<wgpu::SurfaceError>() {
                                    Some(wgpu::SurfaceError::Lost) => {
                                        app.resize(app.renderer.gfx.size);
                                    }
                                    Some(wgpu::SurfaceError::OutOfMemory) => {
                                        log::error!("WGPU out of memory - exiting.");
                                        elwt.exit();
                                    }
                                    Some(e) => log::warn!("Surface error: {:?}", e),
                                    None => {
                                        log::error!("Render loop failed: {:#}", err);
                                        elwt.exit();
                                    }
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            Event::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
