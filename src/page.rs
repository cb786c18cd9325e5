use http::{header::CONTENT_TYPE, Response, StatusCode};

use crate::body::Body;

/// Builds the response served on every GET: the fixed upload page.
pub(crate) fn upload_page() -> Response<Body> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/html")
        .body(Body::from(UPLOAD_PAGE))
        .unwrap()
}

/// Upload form plus the script driving the XHR upload and its progress bar.
/// No per-request computation happens here.
const UPLOAD_PAGE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>File Upload</title>
    <style>
        body {
            display: flex;
            flex-direction: column;
            justify-content: center;
            align-items: center;
            height: 100vh;
            text-align: center;
            font-family: Arial, sans-serif;
        }
        button {
            width: 300px;
            height: 60px;
            font-size: 18px;
            background-color: blue;
            color: white;
            border: none;
            border-radius: 10px;
            cursor: pointer;
            transition: background-color 0.3s ease;
        }
        button.uploading {
            background-color: green;
        }
        progress {
            width: 100%;
            margin-top: 10px;
        }
    </style>
    <script>
        function readErrorMessage(errorMessage) {
            err = JSON.parse(errorMessage)
            return err.message
        }

        function uploadFile() {
            const fileInput = document.getElementById('file');
            const file = fileInput.files[0];
            const button = document.getElementById('uploadButton');
            if (!file) {
                alert('No file selected');
                return;
            }

            button.classList.add('uploading');
            button.innerText = "Uploading... 0%";

            const formData = new FormData();
            formData.append('file', file);

            const xhr = new XMLHttpRequest();
            xhr.open('POST', '/', true);

            let startTime = Date.now();

            xhr.upload.addEventListener('progress', function(event) {
                if (event.lengthComputable) {
                    const percentComplete = ((event.loaded / event.total) * 100).toFixed(2);
                    document.getElementById('progressBar').value = percentComplete;

                    const elapsedTime = (Date.now() - startTime) / 1000; // seconds
                    let speedText = "Speed: 0 MiB/s";
                    if (elapsedTime > 0) {
                        const speed = (event.loaded / (1024 * 1024)) / elapsedTime; // MiB/s
                        speedText = `Speed: ${speed.toFixed(2)} MiB/s`;
                    }
                    document.getElementById('speedText').innerText = speedText;

                    button.innerText = `Uploading... ${percentComplete}%`;
                }
            });

            xhr.onerror = (err) => {
                alert(`Error occurred during file upload: ${readErrorMessage(err.currentTarget.response)}.`);
                location.reload();
            };

            xhr.onload = (err) => {
                if (xhr.status === 200) {
                    alert('File uploaded successfully!');
                } else {
                    alert(`Error occurred during file upload: ${readErrorMessage(err.currentTarget.response)}.`);
                }
                location.reload();
            };

            xhr.send(formData);
        }
    </script>
</head>
<body>
    <h1>Upload File</h1>
    <form>
        <input type="file" id="file" name="file"><br>
        <progress id="progressBar" value="0" max="100"></progress><br>
        <span id="speedText">Speed: 0 MiB/s</span><br>
        <button type="button" id="uploadButton" onclick="uploadFile()">Upload</button>
    </form>
</body>
</html>
"##;
