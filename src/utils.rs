use glib::MainContext;
use gtk4::gdk;
use log::warn;
use messenger_gtk::api::client::ApiClient;
use once_cell::sync::Lazy;

pub static RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build Tokio runtime")
});

pub fn spawn_async<F>(fut: F)
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    RUNTIME.spawn(fut);
}

/// Runs `fut` on the Tokio runtime and hands its result to the GTK main
/// loop through the returned receiver.
pub fn run_async_to_main<T, E, Fut>(fut: Fut) -> glib::Receiver<Result<T, E>>
where
    T: Send + 'static,
    E: Send + 'static,
    Fut: std::future::Future<Output = Result<T, E>> + Send + 'static,
{
    let (tx, rx) = MainContext::channel::<Result<T, E>>(glib::Priority::default());
    spawn_async(async move {
        let res = fut.await;
        let _ = tx.send(res);
    });
    rx
}

/// Downloads a server image and passes the decoded texture to `apply` on
/// the main loop. Failures are logged and leave the placeholder in place.
pub fn load_texture<F>(client: &ApiClient, path: String, apply: F)
where
    F: Fn(&gdk::Texture) + 'static,
{
    let client = client.clone();
    let path_for_log = path.clone();
    let rx = run_async_to_main(async move { client.fetch_asset(&path).await });
    rx.attach(None, move |res| {
        let texture = res
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                gdk::Texture::from_bytes(&glib::Bytes::from_owned(bytes)).map_err(|e| e.to_string())
            });
        match texture {
            Ok(texture) => apply(&texture),
            Err(e) => warn!("could not load {path_for_log}: {e}"),
        }
        glib::ControlFlow::Continue
    });
}
