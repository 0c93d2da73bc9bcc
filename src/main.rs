#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use filesift::app;
use filesift::app::file_dialog::NativeDialogService;
use filesift::app::helpers::lock_state;
use std::sync::{Arc, Mutex};
use tao::{
    event::{Event, StartCause, WindowEvent},
    event_loop::{ControlFlow, EventLoopBuilder},
    window::WindowBuilder,
};
use tracing_subscriber::EnvFilter;
use wry::WebViewBuilder;

#[tokio::main]
async fn main() {
    // Initialize logging; RUST_LOG overrides the default level.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Create the event loop and window
    let event_loop = EventLoopBuilder::<app::events::UserEvent>::with_user_event().build();

    let app_state = app::state::AppState::default();
    let (width, height) = app_state.config.window_size;
    let (pos_x, pos_y) = app_state.config.window_position;

    let window = WindowBuilder::new()
        .with_title("FileSift")
        .with_inner_size(tao::dpi::LogicalSize::new(width, height))
        .with_position(tao::dpi::LogicalPosition::new(pos_x, pos_y))
        .with_min_inner_size(tao::dpi::LogicalSize::new(1000, 650))
        .build(&event_loop)
        .expect("Failed to build Window");

    let window = Arc::new(window);

    // Create the shared application state and the event loop proxy
    let proxy = event_loop.create_proxy();
    let state = Arc::new(Mutex::new(app_state));
    let dialog_service = Arc::new(NativeDialogService);

    let ipc_handler_state = state.clone();
    let ipc_handler_proxy = proxy.clone();
    let ipc_handler_dialog = dialog_service.clone();
    let ipc_handler = move |message: String| {
        app::handle_ipc_message(
            message,
            ipc_handler_dialog.clone(),
            ipc_handler_proxy.clone(),
            ipc_handler_state.clone(),
        );
    };

    // Dropped folders become additional roots.
    let drop_handler_state = state.clone();
    let drop_handler_proxy = proxy.clone();
    let file_drop_handler = move |event| {
        use app::events::UserEvent;
        use app::proxy::EventProxy;
        use wry::FileDropEvent;
        match event {
            FileDropEvent::Hovered { .. } => {
                EventProxy::send_event(&drop_handler_proxy, UserEvent::DragStateChanged(true));
            }
            FileDropEvent::Dropped { paths, .. } => {
                EventProxy::send_event(&drop_handler_proxy, UserEvent::DragStateChanged(false));
                let folders: Vec<_> = paths.into_iter().filter(|p| p.is_dir()).collect();
                if folders.is_empty() {
                    EventProxy::send_event(
                        &drop_handler_proxy,
                        UserEvent::ShowError("Only folders can be dropped here.".to_string()),
                    );
                } else {
                    app::commands::add_root_paths(
                        folders,
                        drop_handler_proxy.clone(),
                        drop_handler_state.clone(),
                    );
                }
            }
            FileDropEvent::Cancelled => {
                EventProxy::send_event(&drop_handler_proxy, UserEvent::DragStateChanged(false));
            }
            _ => (),
        }
        true
    };

    let webview = WebViewBuilder::new(&*window)
        .with_html(include_str!("ui/index.html"))
        .with_devtools(cfg!(debug_assertions))
        .with_ipc_handler(ipc_handler)
        .with_file_drop_handler(file_drop_handler)
        .build()
        .expect("Failed to build WebView");

    let state_for_events = state.clone();
    let window_for_events = window.clone();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::NewEvents(StartCause::Init) => {
                tracing::info!("Application initialized.");
            }
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    tracing::info!("Close requested. Saving final window state...");
                    let mut state_guard = lock_state(&state_for_events);
                    state_guard.shutdown();
                    let scale = window_for_events.scale_factor();
                    let size = window_for_events.inner_size().to_logical::<f64>(scale);
                    let position = window_for_events
                        .outer_position()
                        .unwrap_or_default()
                        .to_logical::<f64>(scale);
                    state_guard.config.window_size = (size.width, size.height);
                    state_guard.config.window_position = (position.x, position.y);
                    state_guard.persist_config();
                    *control_flow = ControlFlow::Exit;
                }
                WindowEvent::Resized(size) => {
                    let size = size.to_logical::<f64>(window_for_events.scale_factor());
                    lock_state(&state_for_events).config.window_size = (size.width, size.height);
                }
                WindowEvent::Moved(position) => {
                    let position = position.to_logical::<f64>(window_for_events.scale_factor());
                    lock_state(&state_for_events).config.window_position = (position.x, position.y);
                }
                _ => (),
            },
            Event::UserEvent(user_event) => {
                app::handle_user_event(user_event, &webview);
            }
            _ => (),
        }
    });
}
